use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::RegisterKind;

/// Database model for a register section (top-level grouping)
#[derive(Debug, Clone, FromRow)]
pub struct Section {
    pub id: Uuid,
    pub kind: RegisterKind,
    pub title: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
