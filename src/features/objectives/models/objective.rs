use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "objective_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    #[default]
    NotStarted,
    InProgress,
    Achieved,
    NotAchieved,
}

/// Database model for a quality objective
#[derive(Debug, Clone, FromRow)]
pub struct Objective {
    pub id: Uuid,
    pub number: i32,
    pub title: String,
    pub description: Option<String>,
    pub target: Option<String>,
    pub owner: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: ObjectiveStatus,
    pub progress_notes: Option<String>,
    pub highlighted: bool,
    pub archived: bool,
    pub sort_order: i32,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
