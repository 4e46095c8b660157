//! Branch-permission join records.
//!
//! A content item (banner, trivia, legal section) applies to a subset of
//! branches through `(objetoName, idObjeto, idSucursal)` rows. No rows for
//! an item means it applies to every branch.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// One `(objetoName, idObjeto, idSucursal)` row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPermission {
    pub objeto_name: String,
    pub id_objeto: DbId,
    pub id_sucursal: DbId,
}

/// Body of `POST /api/permisosSucursal/batch-replace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReplaceRequest {
    pub objeto_name: String,
    pub id_objeto: DbId,
    pub sucursal_ids: Vec<DbId>,
}

/// The set of branches a content item applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BranchScope {
    /// No permission rows: the item applies everywhere.
    #[default]
    All,
    Only(BTreeSet<DbId>),
}

impl BranchScope {
    /// Build a scope from selected branch ids; an empty selection is `All`.
    pub fn from_ids(ids: impl IntoIterator<Item = DbId>) -> Self {
        let ids: BTreeSet<DbId> = ids.into_iter().collect();
        if ids.is_empty() {
            Self::All
        } else {
            Self::Only(ids)
        }
    }

    /// Rebuild the scope an item currently has from its permission rows.
    pub fn from_permissions<'a>(rows: impl IntoIterator<Item = &'a BranchPermission>) -> Self {
        Self::from_ids(rows.into_iter().map(|row| row.id_sucursal))
    }

    /// Whether the item is shown at `branch_id`.
    pub fn includes(&self, branch_id: DbId) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(&branch_id),
        }
    }

    /// Branch ids as sent on the wire (`All` is the empty list).
    pub fn to_ids(&self) -> Vec<DbId> {
        match self {
            Self::All => Vec::new(),
            Self::Only(ids) => ids.iter().copied().collect(),
        }
    }

    pub fn batch_request(&self, objeto_name: &str, id_objeto: DbId) -> BatchReplaceRequest {
        BatchReplaceRequest {
            objeto_name: objeto_name.to_string(),
            id_objeto,
            sucursal_ids: self.to_ids(),
        }
    }
}

/// Rows to create and delete to move an item from its current scope to a
/// desired one, one request per row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionDiff {
    pub to_add: Vec<BranchPermission>,
    pub to_remove: Vec<BranchPermission>,
}

impl PermissionDiff {
    pub fn between(
        objeto_name: &str,
        id_objeto: DbId,
        current: &[BranchPermission],
        desired: &BranchScope,
    ) -> Result<Self, CoreError> {
        if let Some(stray) = current
            .iter()
            .find(|row| row.objeto_name != objeto_name || row.id_objeto != id_objeto)
        {
            return Err(CoreError::Validation(format!(
                "Permission row for {}#{} does not belong to {objeto_name}#{id_objeto}",
                stray.objeto_name, stray.id_objeto
            )));
        }

        let current_ids: BTreeSet<DbId> = current.iter().map(|row| row.id_sucursal).collect();
        let desired_ids: BTreeSet<DbId> = desired.to_ids().into_iter().collect();

        let row = |id_sucursal: DbId| BranchPermission {
            objeto_name: objeto_name.to_string(),
            id_objeto,
            id_sucursal,
        };

        Ok(Self {
            to_add: desired_ids.difference(&current_ids).copied().map(&row).collect(),
            to_remove: current_ids.difference(&desired_ids).copied().map(&row).collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
