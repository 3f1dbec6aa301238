use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::audits::models::{Audit, AuditDocumentLink, AuditStatus};
use crate::features::registry::models::RegisterKind;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuditDto {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    pub scope: Option<String>,

    #[validate(length(max = 255))]
    pub auditor: Option<String>,

    pub planned_start_date: Option<NaiveDate>,
    pub actual_start_date: Option<NaiveDate>,
    pub date_completed: Option<NaiveDate>,
    pub next_audit_date: Option<NaiveDate>,

    /// Generate the follow-up audit once this one is completed
    #[serde(default)]
    pub create_next_audit: bool,

    /// Starting status; may be overridden by the dates
    pub status: Option<AuditStatus>,

    pub findings: Option<String>,

    /// Register entries to audit
    #[serde(default)]
    pub document_ids: Vec<Uuid>,
}

/// Partial update; omitted fields keep their value
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAuditDto {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    pub scope: Option<String>,

    #[validate(length(max = 255))]
    pub auditor: Option<String>,

    pub planned_start_date: Option<NaiveDate>,
    pub actual_start_date: Option<NaiveDate>,
    pub date_completed: Option<NaiveDate>,
    pub next_audit_date: Option<NaiveDate>,
    pub create_next_audit: Option<bool>,
    pub status: Option<AuditStatus>,
    pub findings: Option<String>,

    /// Replaces the linked entries when present
    pub document_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditDocumentDto {
    pub entry_id: Uuid,
    pub kind: RegisterKind,
    pub title: String,
    pub reference: Option<String>,
}

impl From<AuditDocumentLink> for AuditDocumentDto {
    fn from(link: AuditDocumentLink) -> Self {
        Self {
            entry_id: link.entry_id,
            kind: link.kind,
            title: link.title,
            reference: link.reference,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditResponseDto {
    pub id: Uuid,
    pub number: i32,
    pub title: String,
    pub scope: Option<String>,
    pub auditor: Option<String>,
    pub planned_start_date: Option<NaiveDate>,
    pub actual_start_date: Option<NaiveDate>,
    pub date_completed: Option<NaiveDate>,
    pub next_audit_date: Option<NaiveDate>,
    pub create_next_audit: bool,
    pub has_generated_next_audit: bool,
    pub status: AuditStatus,
    pub findings: Option<String>,
    pub highlighted: bool,
    pub archived: bool,
    pub documents: Vec<AuditDocumentDto>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuditResponseDto {
    pub fn from_audit(audit: Audit, documents: Vec<AuditDocumentDto>) -> Self {
        Self {
            id: audit.id,
            number: audit.number,
            title: audit.title,
            scope: audit.scope,
            auditor: audit.auditor,
            planned_start_date: audit.planned_start_date,
            actual_start_date: audit.actual_start_date,
            date_completed: audit.date_completed,
            next_audit_date: audit.next_audit_date,
            create_next_audit: audit.create_next_audit,
            has_generated_next_audit: audit.has_generated_next_audit,
            status: audit.status,
            findings: audit.findings,
            highlighted: audit.highlighted,
            archived: audit.archived,
            documents,
            created_by: audit.created_by,
            updated_by: audit.updated_by,
            created_at: audit.created_at,
            updated_at: audit.updated_at,
        }
    }
}

/// PATCH body for audits, dispatched on `action`
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum AuditActionDto {
    ToggleHighlight,
    Archive,
    Unarchive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults() {
        let dto: CreateAuditDto =
            serde_json::from_value(serde_json::json!({ "title": "Supplier audit" })).unwrap();
        assert!(!dto.create_next_audit);
        assert!(dto.document_ids.is_empty());
        assert!(dto.status.is_none());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_dates_are_iso() {
        let dto: CreateAuditDto = serde_json::from_value(serde_json::json!({
            "title": "Supplier audit",
            "planned_start_date": "2025-03-14"
        }))
        .unwrap();
        assert_eq!(dto.planned_start_date, NaiveDate::from_ymd_opt(2025, 3, 14));

        assert!(serde_json::from_value::<CreateAuditDto>(serde_json::json!({
            "title": "Supplier audit",
            "planned_start_date": "14/03/2025"
        }))
        .is_err());
    }

    #[test]
    fn test_audit_actions() {
        assert!(matches!(
            serde_json::from_value::<AuditActionDto>(serde_json::json!({ "action": "archive" }))
                .unwrap(),
            AuditActionDto::Archive
        ));
        assert!(serde_json::from_value::<AuditActionDto>(
            serde_json::json!({ "action": "approve" })
        )
        .is_err());
    }
}
