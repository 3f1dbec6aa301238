use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::features::history::models::{ReviewRecord, VersionRecord};
use crate::features::registry::models::RegisterKind;
use crate::shared::validation::VERSION_REGEX;

/// Restrict a history log to one section
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryFilter {
    pub section_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVersionDto {
    pub section_id: Option<Uuid>,

    #[validate(regex(path = *VERSION_REGEX, message = "number must look like '1', '2.1' or 'Rev 3'"))]
    pub number: String,

    pub version_date: NaiveDate,

    #[validate(length(min = 1, message = "details are required"))]
    pub details: String,

    #[validate(length(min = 1, max = 255))]
    pub author: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_review_dates"))]
pub struct CreateReviewDto {
    pub section_id: Option<Uuid>,

    pub reviewed_on: NaiveDate,

    #[validate(length(min = 1, message = "details are required"))]
    pub details: String,

    #[validate(length(min = 1, max = 255))]
    pub reviewer: String,

    pub next_review_date: Option<NaiveDate>,
}

fn validate_review_dates(dto: &CreateReviewDto) -> Result<(), ValidationError> {
    match dto.next_review_date {
        Some(next) if next < dto.reviewed_on => Err(ValidationError::new(
            "next_review_date_before_reviewed_on",
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VersionResponseDto {
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

impl From<VersionRecord> for VersionResponseDto {
    fn from(v: VersionRecord) -> Self {
        Self {
            id: v.id,
            kind: v.kind,
            section_id: v.section_id,
            number: v.number,
            version_date: v.version_date,
            details: v.details,
            author: v.author,
            created_by: v.created_by,
            created_at: v.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponseDto {
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

impl From<ReviewRecord> for ReviewResponseDto {
    fn from(r: ReviewRecord) -> Self {
        Self {
            id: r.id,
            kind: r.kind,
            section_id: r.section_id,
            reviewed_on: r.reviewed_on,
            details: r.details,
            reviewer: r.reviewer,
            next_review_date: r.next_review_date,
            created_by: r.created_by,
            created_at: r.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::lorem::en::Paragraph;
    use fake::faker::name::en::Name;
    use fake::Fake;

    fn review(reviewed_on: NaiveDate, next: Option<NaiveDate>) -> CreateReviewDto {
        CreateReviewDto {
            section_id: None,
            reviewed_on,
            details: Paragraph(1..2).fake(),
            reviewer: Name().fake(),
            next_review_date: next,
        }
    }

    #[test]
    fn test_next_review_must_not_precede_review() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(review(today, None).validate().is_ok());
        assert!(review(today, today.succ_opt()).validate().is_ok());
        assert!(review(today, today.pred_opt()).validate().is_err());
    }

    #[test]
    fn test_version_number_format() {
        let mut dto = CreateVersionDto {
            section_id: None,
            number: "3.2".to_string(),
            version_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            details: Paragraph(1..2).fake(),
            author: Name().fake(),
        };
        assert!(dto.validate().is_ok());

        dto.number = "three".to_string();
        assert!(dto.validate().is_err());
    }
}
