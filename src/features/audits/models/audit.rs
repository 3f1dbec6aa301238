use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::registry::models::RegisterKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "audit_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Status an audit ends up with after a save.
///
/// An actual start on or before `today` moves a not-completed audit to
/// in progress; a completion date always means completed.
pub fn derive_status(
    submitted: AuditStatus,
    actual_start_date: Option<NaiveDate>,
    date_completed: Option<NaiveDate>,
    today: NaiveDate,
) -> AuditStatus {
    let mut status = submitted;

    if let Some(start) = actual_start_date {
        if start <= today && status != AuditStatus::Completed {
            status = AuditStatus::InProgress;
        }
    }

    if date_completed.is_some() {
        status = AuditStatus::Completed;
    }

    status
}

/// Database model for an audit
#[derive(Debug, Clone, FromRow)]
pub struct Audit {
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
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Audit {
    /// A completed audit asks for a follow-up it has not produced yet
    pub fn needs_next_audit(&self) -> bool {
        self.status == AuditStatus::Completed
            && self.create_next_audit
            && self.next_audit_date.is_some()
            && !self.has_generated_next_audit
    }
}

/// A register entry selected for an audit, with its title for display
#[derive(Debug, Clone, FromRow)]
pub struct AuditDocumentLink {
    pub audit_id: Uuid,
    pub entry_id: Uuid,
    pub kind: RegisterKind,
    pub title: String,
    pub reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_only_planned_date_stays_not_started() {
        let today = date(2025, 3, 1);
        assert_eq!(
            derive_status(AuditStatus::NotStarted, None, None, today),
            AuditStatus::NotStarted
        );
    }

    #[test]
    fn test_started_on_or_before_today_is_in_progress() {
        let today = date(2025, 3, 1);
        assert_eq!(
            derive_status(AuditStatus::NotStarted, Some(today), None, today),
            AuditStatus::InProgress
        );
        assert_eq!(
            derive_status(AuditStatus::NotStarted, Some(date(2025, 2, 1)), None, today),
            AuditStatus::InProgress
        );
    }

    #[test]
    fn test_future_start_keeps_submitted_status() {
        let today = date(2025, 3, 1);
        assert_eq!(
            derive_status(AuditStatus::NotStarted, Some(date(2025, 4, 1)), None, today),
            AuditStatus::NotStarted
        );
    }

    #[test]
    fn test_completion_date_wins() {
        let today = date(2025, 3, 1);
        assert_eq!(
            derive_status(
                AuditStatus::NotStarted,
                Some(date(2025, 4, 1)),
                Some(date(2025, 2, 1)),
                today
            ),
            AuditStatus::Completed
        );
        assert_eq!(
            derive_status(AuditStatus::InProgress, None, Some(today), today),
            AuditStatus::Completed
        );
    }

    #[test]
    fn test_submitted_completed_is_not_downgraded_by_start() {
        let today = date(2025, 3, 1);
        assert_eq!(
            derive_status(AuditStatus::Completed, Some(date(2025, 1, 1)), None, today),
            AuditStatus::Completed
        );
    }

    fn audit(status: AuditStatus) -> Audit {
        Audit {
            id: Uuid::new_v4(),
            number: 1,
            title: "Internal audit".to_string(),
            scope: None,
            auditor: None,
            planned_start_date: None,
            actual_start_date: None,
            date_completed: None,
            next_audit_date: Some(date(2026, 1, 1)),
            create_next_audit: true,
            has_generated_next_audit: false,
            status,
            findings: None,
            highlighted: false,
            archived: false,
            created_by: "user-1".to_string(),
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_needs_next_audit() {
        assert!(audit(AuditStatus::Completed).needs_next_audit());
        assert!(!audit(AuditStatus::InProgress).needs_next_audit());

        let mut done = audit(AuditStatus::Completed);
        done.has_generated_next_audit = true;
        assert!(!done.needs_next_audit());

        let mut no_date = audit(AuditStatus::Completed);
        no_date.next_audit_date = None;
        assert!(!no_date.needs_next_audit());

        let mut not_wanted = audit(AuditStatus::Completed);
        not_wanted.create_next_audit = false;
        assert!(!not_wanted.needs_next_audit());
    }
}
