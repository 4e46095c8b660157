//! Managed entities and the schema-less record shape they share.
//!
//! Every entity the dashboard manages is a flat record with an integer
//! identity, a `status` flag (`1` active, `0` inactive) and a bag of
//! entity-specific fields. Field lists are owned by the front end; this
//! module only knows about the columns every entity has in common.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// The content entities exposed by the REST backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Branch,
    Banner,
    FooterBanner,
    Trivia,
    LegalSection,
    Coupon,
    StreamingCard,
    CisCenter,
    SocialLink,
    Tariff,
}

impl EntityKind {
    /// All entity kinds, in sidebar order.
    pub const ALL: [EntityKind; 10] = [
        Self::Branch,
        Self::Banner,
        Self::FooterBanner,
        Self::Trivia,
        Self::LegalSection,
        Self::Coupon,
        Self::StreamingCard,
        Self::CisCenter,
        Self::SocialLink,
        Self::Tariff,
    ];

    /// Collection segment under `/api/`.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Branch => "sucursales",
            Self::Banner => "banners",
            Self::FooterBanner => "bannersfooter",
            Self::Trivia => "trivias",
            Self::LegalSection => "terminos",
            Self::Coupon => "cupones",
            Self::StreamingCard => "streaming",
            Self::CisCenter => "centroscis",
            Self::SocialLink => "redessociales",
            Self::Tariff => "tarifarios",
        }
    }

    /// `objetoName` used by the branch-permission join resource, for the
    /// entities that can be scoped to a subset of branches.
    pub fn permission_object(self) -> Option<&'static str> {
        match self {
            Self::Banner => Some("banner"),
            Self::Trivia => Some("trivia"),
            Self::LegalSection => Some("terminos"),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Branch => "Branch",
            Self::Banner => "Banner",
            Self::FooterBanner => "Footer banner",
            Self::Trivia => "Trivia",
            Self::LegalSection => "Legal section",
            Self::Coupon => "Coupon",
            Self::StreamingCard => "Streaming card",
            Self::CisCenter => "CIS center",
            Self::SocialLink => "Social link",
            Self::Tariff => "Tariff",
        }
    }

    /// Parse a collection segment back into its kind.
    pub fn from_collection(collection: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.collection() == collection)
            .ok_or_else(|| {
                CoreError::Validation(format!("Unknown entity collection '{collection}'"))
            })
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Soft-delete flag carried by every record. Serialized as `1` / `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    /// The opposite status, used by the list view's status switch.
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

impl TryFrom<i64> for RecordStatus {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Active),
            0 => Ok(Self::Inactive),
            other => Err(CoreError::Validation(format!(
                "Invalid status {other}. Must be 1 (active) or 0 (inactive)"
            ))),
        }
    }
}

impl From<RecordStatus> for i64 {
    fn from(status: RecordStatus) -> Self {
        match status {
            RecordStatus::Active => 1,
            RecordStatus::Inactive => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A stored record of any entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: DbId,
    pub status: RecordStatus,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Payload for creating a record; the server assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub status: RecordStatus,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl NewRecord {
    /// New records start active unless the form says otherwise.
    pub fn active(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            status: RecordStatus::Active,
            fields,
        }
    }
}

impl Record {
    /// Look up a field, treating `id` and `status` as fields too so the
    /// table engine can sort and search on them.
    pub fn field(&self, name: &str) -> Option<serde_json::Value> {
        match name {
            "id" => Some(serde_json::Value::from(self.id)),
            "status" => Some(serde_json::Value::from(i64::from(self.status))),
            other => self.fields.get(other).cloned(),
        }
    }

    /// Copy of this record with the status flipped, ready for a full PUT.
    pub fn with_toggled_status(&self) -> Self {
        Self {
            status: self.status.toggled(),
            ..self.clone()
        }
    }
}
