use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::RegisterKind;

/// Database model for a register category
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub kind: RegisterKind,
    pub section_id: Uuid,
    pub title: String,
    pub highlighted: bool,
    pub archived: bool,
    pub sort_order: i32,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
