use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::registry::models::RegisterKind;

/// One line of a register's version log
#[derive(Debug, Clone, FromRow)]
pub struct VersionRecord {
    pub id: Uuid,
    pub kind: RegisterKind,
    pub section_id: Option<Uuid>,
    pub number: String,
    pub version_date: NaiveDate,
    pub details: String,
    pub author: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// One line of a register's review log
#[derive(Debug, Clone, FromRow)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub kind: RegisterKind,
    pub section_id: Option<Uuid>,
    pub reviewed_on: NaiveDate,
    pub details: String,
    pub reviewer: String,
    pub next_review_date: Option<NaiveDate>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}
