use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::RegisterKind;

/// Database model for a register entry (procedure, certificate, risk assessment, ...)
#[derive(Debug, Clone, FromRow)]
pub struct Entry {
    pub id: Uuid,
    pub kind: RegisterKind,
    pub category_id: Uuid,
    pub title: String,
    pub reference: Option<String>,
    pub version: Option<String>,
    pub owner: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub review_date: Option<NaiveDate>,
    pub status: Option<String>,
    /// Per-kind fields that have no column of their own
    pub details: serde_json::Value,
    pub approved: bool,
    pub highlighted: bool,
    pub archived: bool,
    pub sort_order: i32,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
