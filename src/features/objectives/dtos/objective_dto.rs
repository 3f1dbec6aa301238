use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::objectives::models::{Objective, ObjectiveStatus};
use crate::shared::ordering::ReorderTargetDto;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateObjectiveDto {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    pub description: Option<String>,

    pub target: Option<String>,

    #[validate(length(max = 255))]
    pub owner: Option<String>,

    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: ObjectiveStatus,

    pub progress_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateObjectiveDto {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub target: Option<String>,

    #[validate(length(max = 255))]
    pub owner: Option<String>,

    pub due_date: Option<NaiveDate>,

    pub status: Option<ObjectiveStatus>,

    pub progress_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ObjectiveResponseDto {
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

impl From<Objective> for ObjectiveResponseDto {
    fn from(o: Objective) -> Self {
        Self {
            id: o.id,
            number: o.number,
            title: o.title,
            description: o.description,
            target: o.target,
            owner: o.owner,
            due_date: o.due_date,
            status: o.status,
            progress_notes: o.progress_notes,
            highlighted: o.highlighted,
            archived: o.archived,
            sort_order: o.sort_order,
            created_by: o.created_by,
            updated_by: o.updated_by,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

/// PATCH body for objectives, dispatched on `action`
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ObjectiveActionDto {
    Reorder(ReorderTargetDto),
    ToggleHighlight,
    Archive,
    Unarchive,
}
