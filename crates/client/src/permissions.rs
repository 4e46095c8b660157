//! Client for the `permisosSucursal` branch-permission join resource.

use adminboard_core::branch_permissions::{BranchPermission, BranchScope, PermissionDiff};
use adminboard_core::error::CoreError;
use adminboard_core::records::EntityKind;
use adminboard_core::types::DbId;
use serde::Serialize;

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

const PERMISSIONS_PATH: &str = "/api/permisosSucursal";
const BATCH_REPLACE_PATH: &str = "/api/permisosSucursal/batch-replace";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemQuery<'a> {
    objeto_name: &'a str,
    id_objeto: DbId,
}

#[derive(Debug, Clone)]
pub struct BranchPermissionClient {
    api: ApiClient,
}

impl BranchPermissionClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `objetoName` for `kind`, or a validation error for entities that are
    /// never scoped to branches.
    pub fn object_name(kind: EntityKind) -> ClientResult<&'static str> {
        kind.permission_object().ok_or_else(|| {
            ClientError::Core(CoreError::Validation(format!(
                "{} records cannot be restricted to branches",
                kind.label()
            )))
        })
    }

    /// Permission rows of one content item.
    pub async fn list(&self, objeto_name: &str, id_objeto: DbId) -> ClientResult<Vec<BranchPermission>> {
        self.api
            .get_json_with_query(
                PERMISSIONS_PATH,
                &ItemQuery {
                    objeto_name,
                    id_objeto,
                },
            )
            .await
    }

    /// Current scope of one content item.
    pub async fn scope(&self, objeto_name: &str, id_objeto: DbId) -> ClientResult<BranchScope> {
        let rows = self.list(objeto_name, id_objeto).await?;
        Ok(BranchScope::from_permissions(&rows))
    }

    pub async fn assign(&self, permission: &BranchPermission) -> ClientResult<()> {
        self.api.post_unit(PERMISSIONS_PATH, permission).await
    }

    pub async fn revoke(&self, permission: &BranchPermission) -> ClientResult<()> {
        self.api.delete(PERMISSIONS_PATH, permission).await
    }

    /// Replace the scope of an item in one call.
    pub async fn batch_replace(
        &self,
        objeto_name: &str,
        id_objeto: DbId,
        scope: &BranchScope,
    ) -> ClientResult<()> {
        let body = scope.batch_request(objeto_name, id_objeto);
        self.api.post_unit(BATCH_REPLACE_PATH, &body).await?;
        tracing::info!(
            objeto_name,
            id_objeto,
            branches = body.sucursal_ids.len(),
            "Branch permissions replaced",
        );
        Ok(())
    }

    /// Replace the scope of an item row by row: list, diff, then one
    /// request per added or removed branch. Stops at the first failure;
    /// rows already written stay written.
    pub async fn replace_individually(
        &self,
        objeto_name: &str,
        id_objeto: DbId,
        scope: &BranchScope,
    ) -> ClientResult<PermissionDiff> {
        let current = self.list(objeto_name, id_objeto).await?;
        let diff = PermissionDiff::between(objeto_name, id_objeto, &current, scope)?;

        for row in &diff.to_remove {
            self.revoke(row).await?;
        }
        for row in &diff.to_add {
            self.assign(row).await?;
        }

        tracing::info!(
            objeto_name,
            id_objeto,
            added = diff.to_add.len(),
            removed = diff.to_remove.len(),
            "Branch permissions synchronised",
        );
        Ok(diff)
    }
}
