use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// What a document is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelatedEntityType {
    RegisterEntry,
    Audit,
    Objective,
}

impl RelatedEntityType {
    /// Value stored in `documents.related_entity_type`
    pub fn as_str(&self) -> &'static str {
        match self {
            RelatedEntityType::RegisterEntry => "register_entry",
            RelatedEntityType::Audit => "audit",
            RelatedEntityType::Objective => "objective",
        }
    }

    /// Table holding the owning rows
    pub fn table(&self) -> &'static str {
        match self {
            RelatedEntityType::RegisterEntry => "register_entries",
            RelatedEntityType::Audit => "audits",
            RelatedEntityType::Objective => "objectives",
        }
    }
}

impl std::fmt::Display for RelatedEntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database model for an uploaded document
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub file_url: String,
    /// Storage key relative to the upload root
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: String,
    pub related_entity_type: String,
    pub related_entity_id: Uuid,
    pub created_at: DateTime<Utc>,
}
