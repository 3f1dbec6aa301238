use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::audits::dtos::{
    AuditActionDto, AuditDocumentDto, AuditResponseDto, CreateAuditDto, UpdateAuditDto,
};
use crate::features::audits::models::{derive_status, Audit, AuditDocumentLink, AuditStatus};
use crate::features::audits::services::AuditCache;
use crate::features::documents::models::RelatedEntityType;
use crate::features::documents::DocumentService;
use crate::shared::constants::AUDITS_CACHE_KEY;
use crate::shared::sortable::{Flag, SortableTable};

const AUDIT_COLUMNS: &str = "id, number, title, scope, auditor, planned_start_date, \
     actual_start_date, date_completed, next_audit_date, create_next_audit, \
     has_generated_next_audit, status, findings, highlighted, archived, created_by, \
     updated_by, created_at, updated_at";

const AUDITS: SortableTable = SortableTable::new("audits", None, "Audit");

/// Service for audits and their follow-ups
pub struct AuditService {
    pool: PgPool,
    cache: Arc<AuditCache>,
    documents: Arc<DocumentService>,
}

impl AuditService {
    pub fn new(
        pool: PgPool,
        cache: Arc<AuditCache>,
        documents: Arc<DocumentService>,
    ) -> Self {
        Self {
            pool,
            cache,
            documents,
        }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Audit with id {} not found", id))
    }

    /// `max(number) + 1`. Not locked: two concurrent creates can share a number.
    async fn next_number<'e, E>(executor: E) -> Result<i32>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i32>("SELECT COALESCE(MAX(number), 0) + 1 FROM audits")
            .fetch_one(executor)
            .await
            .map_err(AppError::Database)
    }

    async fn links_for<'e, E>(executor: E, audit_ids: &[Uuid]) -> Result<Vec<AuditDocumentLink>>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, AuditDocumentLink>(
            "SELECT ad.audit_id, ad.entry_id, ad.kind, e.title, e.reference \
             FROM audit_documents ad \
             JOIN register_entries e ON e.id = ad.entry_id \
             WHERE ad.audit_id = ANY($1) \
             ORDER BY ad.kind, e.sort_order, e.title",
        )
        .bind(audit_ids)
        .fetch_all(executor)
        .await
        .map_err(AppError::Database)
    }

    fn attach(audits: Vec<Audit>, links: Vec<AuditDocumentLink>) -> Vec<AuditResponseDto> {
        audits
            .into_iter()
            .map(|audit| {
                let documents = links
                    .iter()
                    .filter(|l| l.audit_id == audit.id)
                    .cloned()
                    .map(AuditDocumentDto::from)
                    .collect();
                AuditResponseDto::from_audit(audit, documents)
            })
            .collect()
    }

    /// Audits in number order with their linked entries, read from one snapshot
    pub async fn list(&self, include_archived: bool) -> Result<Vec<AuditResponseDto>> {
        if !include_archived {
            if let Some(audits) = self.cache.get(AUDITS_CACHE_KEY).await {
                return Ok(audits);
            }
        }
        let generation = self.cache.generation(AUDITS_CACHE_KEY).await;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let sql = format!(
            "SELECT {} FROM audits WHERE ($1 OR archived = FALSE) ORDER BY number, created_at",
            AUDIT_COLUMNS
        );
        let audits = sqlx::query_as::<_, Audit>(&sql)
            .bind(include_archived)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list audits: {:?}", e);
                AppError::Database(e)
            })?;

        let ids: Vec<Uuid> = audits.iter().map(|a| a.id).collect();
        let links = Self::links_for(&mut *tx, &ids).await?;
        tx.commit().await.map_err(AppError::Database)?;

        let audits = Self::attach(audits, links);

        if !include_archived {
            self.cache
                .put_if_generation(AUDITS_CACHE_KEY, generation, audits.clone())
                .await;
        }
        Ok(audits)
    }

    pub async fn get(&self, id: Uuid) -> Result<AuditResponseDto> {
        let sql = format!("SELECT {} FROM audits WHERE id = $1", AUDIT_COLUMNS);
        let audit = sqlx::query_as::<_, Audit>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| Self::not_found(id))?;

        let links = Self::links_for(&self.pool, &[id]).await?;
        Self::attach(vec![audit], links)
            .pop()
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn create(&self, dto: CreateAuditDto, created_by: &str) -> Result<AuditResponseDto> {
        let status = derive_status(
            dto.status.unwrap_or(AuditStatus::NotStarted),
            dto.actual_start_date,
            dto.date_completed,
            Utc::now().date_naive(),
        );

        let number = Self::next_number(&self.pool).await?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let sql = format!(
            "INSERT INTO audits \
             (number, title, scope, auditor, planned_start_date, actual_start_date, \
              date_completed, next_audit_date, create_next_audit, status, findings, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {}",
            AUDIT_COLUMNS
        );
        let audit = sqlx::query_as::<_, Audit>(&sql)
            .bind(number)
            .bind(dto.title.trim())
            .bind(&dto.scope)
            .bind(&dto.auditor)
            .bind(dto.planned_start_date)
            .bind(dto.actual_start_date)
            .bind(dto.date_completed)
            .bind(dto.next_audit_date)
            .bind(dto.create_next_audit)
            .bind(status)
            .bind(&dto.findings)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from_db)?;

        Self::link_entries(&mut tx, audit.id, &dto.document_ids).await?;

        if audit.needs_next_audit() {
            Self::generate_next(&mut tx, &audit, created_by).await?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Audit #{} ({}) created by {} with status {:?}",
            audit.number,
            audit.id,
            created_by,
            audit.status
        );
        self.cache.invalidate(AUDITS_CACHE_KEY).await;
        self.get(audit.id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateAuditDto,
        updated_by: &str,
    ) -> Result<AuditResponseDto> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let sql = format!("SELECT {} FROM audits WHERE id = $1 FOR UPDATE", AUDIT_COLUMNS);
        let current = sqlx::query_as::<_, Audit>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| Self::not_found(id))?;

        let actual_start_date = dto.actual_start_date.or(current.actual_start_date);
        let date_completed = dto.date_completed.or(current.date_completed);
        let status = derive_status(
            dto.status.unwrap_or(current.status),
            actual_start_date,
            date_completed,
            Utc::now().date_naive(),
        );

        let sql = format!(
            "UPDATE audits SET \
               title = COALESCE($1, title), \
               scope = COALESCE($2, scope), \
               auditor = COALESCE($3, auditor), \
               planned_start_date = COALESCE($4, planned_start_date), \
               actual_start_date = $5, \
               date_completed = $6, \
               next_audit_date = COALESCE($7, next_audit_date), \
               create_next_audit = COALESCE($8, create_next_audit), \
               status = $9, \
               findings = COALESCE($10, findings), \
               updated_by = $11, \
               updated_at = NOW() \
             WHERE id = $12 \
             RETURNING {}",
            AUDIT_COLUMNS
        );
        let audit = sqlx::query_as::<_, Audit>(&sql)
            .bind(dto.title.as_deref().map(str::trim))
            .bind(&dto.scope)
            .bind(&dto.auditor)
            .bind(dto.planned_start_date)
            .bind(actual_start_date)
            .bind(date_completed)
            .bind(dto.next_audit_date)
            .bind(dto.create_next_audit)
            .bind(status)
            .bind(&dto.findings)
            .bind(updated_by)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from_db)?;

        if let Some(document_ids) = &dto.document_ids {
            sqlx::query("DELETE FROM audit_documents WHERE audit_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            Self::link_entries(&mut tx, id, document_ids).await?;
        }

        if audit.needs_next_audit() {
            Self::generate_next(&mut tx, &audit, updated_by).await?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Audit #{} ({}) updated by {}: {:?} -> {:?}",
            audit.number,
            id,
            updated_by,
            current.status,
            audit.status
        );
        self.cache.invalidate(AUDITS_CACHE_KEY).await;
        self.get(id).await
    }

    /// Link register entries; every id must exist
    async fn link_entries(
        tx: &mut Transaction<'_, Postgres>,
        audit_id: Uuid,
        entry_ids: &[Uuid],
    ) -> Result<()> {
        let unique: Vec<Uuid> = entry_ids
            .iter()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if unique.is_empty() {
            return Ok(());
        }

        let linked = sqlx::query(
            "INSERT INTO audit_documents (audit_id, entry_id, kind) \
             SELECT $1, id, kind FROM register_entries WHERE id = ANY($2)",
        )
        .bind(audit_id)
        .bind(&unique)
        .execute(&mut **tx)
        .await
        .map_err(AppError::from_db)?;

        if linked.rows_affected() != unique.len() as u64 {
            return Err(AppError::Validation(
                "One or more document_ids do not refer to register entries".to_string(),
            ));
        }
        Ok(())
    }

    /// Insert the follow-up audit and mark `audit` as having produced it
    async fn generate_next(
        tx: &mut Transaction<'_, Postgres>,
        audit: &Audit,
        created_by: &str,
    ) -> Result<Uuid> {
        let number = Self::next_number(&mut **tx).await?;

        let next_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO audits \
             (number, title, scope, auditor, planned_start_date, status, created_by) \
             VALUES ($1, $2, $3, $4, $5, 'not_started', $6) \
             RETURNING id",
        )
        .bind(number)
        .bind(&audit.title)
        .bind(&audit.scope)
        .bind(&audit.auditor)
        .bind(audit.next_audit_date)
        .bind(created_by)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::from_db)?;

        sqlx::query(
            "INSERT INTO audit_documents (audit_id, entry_id, kind) \
             SELECT $1, entry_id, kind FROM audit_documents WHERE audit_id = $2",
        )
        .bind(next_id)
        .bind(audit.id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        sqlx::query(
            "UPDATE audits SET has_generated_next_audit = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(audit.id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        tracing::info!(
            "Audit #{} generated follow-up #{} ({}) planned for {:?}",
            audit.number,
            number,
            next_id,
            audit.next_audit_date
        );
        Ok(next_id)
    }

    pub async fn apply_action(
        &self,
        id: Uuid,
        action: AuditActionDto,
        user: &str,
    ) -> Result<AuditResponseDto> {
        match action {
            AuditActionDto::ToggleHighlight => {
                AUDITS
                    .toggle_flag(&self.pool, id, Flag::Highlighted, user)
                    .await?;
            }
            AuditActionDto::Archive => {
                AUDITS
                    .set_flag(&self.pool, id, Flag::Archived, true, user)
                    .await?;
            }
            AuditActionDto::Unarchive => {
                AUDITS
                    .set_flag(&self.pool, id, Flag::Archived, false, user)
                    .await?;
            }
        }

        self.cache.invalidate(AUDITS_CACHE_KEY).await;
        self.get(id).await
    }

    /// Delete an audit, its entry links and its documents
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let deleted = sqlx::query("DELETE FROM audits WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if deleted.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }

        let paths = DocumentService::detach_all(&mut tx, RelatedEntityType::Audit, &[id]).await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!("Audit {} deleted with {} documents", id, paths.len());
        self.cache.invalidate(AUDITS_CACHE_KEY).await;
        self.documents.remove_files(paths).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::discard_documents;
    use chrono::{Days, NaiveDate};
    use std::time::Duration;

    const AUDITOR: &str = "auditor-1";

    fn service(pool: PgPool) -> AuditService {
        let (documents, _) = discard_documents(&pool);
        AuditService::new(
            pool,
            Arc::new(AuditCache::new(Duration::from_secs(60))),
            documents,
        )
    }

    fn new_audit(title: &str) -> CreateAuditDto {
        CreateAuditDto {
            title: title.to_string(),
            scope: None,
            auditor: None,
            planned_start_date: None,
            actual_start_date: None,
            date_completed: None,
            next_audit_date: None,
            create_next_audit: false,
            status: None,
            findings: None,
            document_ids: Vec::new(),
        }
    }

    async fn seed_entry(pool: &PgPool, title: &str) -> Uuid {
        let section: Uuid = sqlx::query_scalar(
            "INSERT INTO register_sections (kind, title) VALUES ('procedures', 'Core') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let category: Uuid = sqlx::query_scalar(
            "INSERT INTO register_categories (kind, section_id, title, created_by) \
             VALUES ('procedures', $1, 'General', 'seed') RETURNING id",
        )
        .bind(section)
        .fetch_one(pool)
        .await
        .unwrap();
        sqlx::query_scalar(
            "INSERT INTO register_entries (kind, category_id, title, created_by) \
             VALUES ('procedures', $1, $2, 'seed') RETURNING id",
        )
        .bind(category)
        .bind(title)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn planned() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2030, 6, 1)
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_numbering_and_completion_on_update(pool: PgPool) {
        let audits = service(pool);

        let first = audits
            .create(
                CreateAuditDto {
                    planned_start_date: planned(),
                    ..new_audit("Quality system audit")
                },
                AUDITOR,
            )
            .await
            .unwrap();
        assert_eq!(first.number, 1);
        assert_eq!(first.status, AuditStatus::NotStarted);

        let second = audits.create(new_audit("Supplier audit"), AUDITOR).await.unwrap();
        assert_eq!(second.number, 2);

        let completed = audits
            .update(
                first.id,
                UpdateAuditDto {
                    date_completed: NaiveDate::from_ymd_opt(2030, 6, 3),
                    ..Default::default()
                },
                AUDITOR,
            )
            .await
            .unwrap();
        assert_eq!(completed.status, AuditStatus::Completed);
        assert_eq!(completed.number, 1);
        assert_eq!(completed.planned_start_date, planned());
        assert_eq!(completed.updated_by.as_deref(), Some(AUDITOR));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_created_audit_keeps_submitted_fields(pool: PgPool) {
        let entry = seed_entry(&pool, "Document control").await;
        let audits = service(pool);

        let audit = audits
            .create(
                CreateAuditDto {
                    scope: Some("Clause 7.5".to_string()),
                    auditor: Some("J. Smith".to_string()),
                    planned_start_date: planned(),
                    findings: Some("None yet".to_string()),
                    document_ids: vec![entry],
                    ..new_audit("Documentation audit")
                },
                AUDITOR,
            )
            .await
            .unwrap();

        assert_eq!(audit.title, "Documentation audit");
        assert_eq!(audit.scope.as_deref(), Some("Clause 7.5"));
        assert_eq!(audit.auditor.as_deref(), Some("J. Smith"));
        assert_eq!(audit.planned_start_date, planned());
        assert_eq!(audit.findings.as_deref(), Some("None yet"));
        assert_eq!(audit.created_by, AUDITOR);
        assert_eq!(audit.documents.len(), 1);
        assert_eq!(audit.documents[0].entry_id, entry);
        assert_eq!(audit.documents[0].title, "Document control");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_started_audit_is_in_progress(pool: PgPool) {
        let audits = service(pool);
        let today = Utc::now().date_naive();

        let audit = audits
            .create(
                CreateAuditDto {
                    actual_start_date: today.checked_sub_days(Days::new(1)),
                    ..new_audit("Started yesterday")
                },
                AUDITOR,
            )
            .await
            .unwrap();
        assert_eq!(audit.status, AuditStatus::InProgress);

        let completed = audits
            .create(
                CreateAuditDto {
                    actual_start_date: today.checked_add_days(Days::new(30)),
                    date_completed: Some(today),
                    ..new_audit("Completed early")
                },
                AUDITOR,
            )
            .await
            .unwrap();
        assert_eq!(completed.status, AuditStatus::Completed);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_completion_generates_one_follow_up(pool: PgPool) {
        let entry = seed_entry(&pool, "Calibration").await;
        let audits = service(pool);

        let audit = audits
            .create(
                CreateAuditDto {
                    create_next_audit: true,
                    next_audit_date: NaiveDate::from_ymd_opt(2031, 6, 1),
                    document_ids: vec![entry],
                    ..new_audit("Annual audit")
                },
                AUDITOR,
            )
            .await
            .unwrap();
        assert!(!audit.has_generated_next_audit);

        let done = UpdateAuditDto {
            date_completed: NaiveDate::from_ymd_opt(2030, 6, 1),
            ..Default::default()
        };
        let completed = audits.update(audit.id, done, AUDITOR).await.unwrap();
        assert!(completed.has_generated_next_audit);

        let again = UpdateAuditDto {
            findings: Some("Closed".to_string()),
            ..Default::default()
        };
        audits.update(audit.id, again, AUDITOR).await.unwrap();

        let all = audits.list(false).await.unwrap();
        assert_eq!(all.len(), 2);
        let follow_up = &all[1];
        assert_eq!(follow_up.number, 2);
        assert_eq!(follow_up.title, "Annual audit");
        assert_eq!(follow_up.status, AuditStatus::NotStarted);
        assert_eq!(follow_up.planned_start_date, NaiveDate::from_ymd_opt(2031, 6, 1));
        assert_eq!(follow_up.documents.len(), 1);
        assert_eq!(follow_up.documents[0].entry_id, entry);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_archive_unarchive_and_highlight_round_trip(pool: PgPool) {
        let audits = service(pool);
        let audit = audits.create(new_audit("Site audit"), AUDITOR).await.unwrap();
        assert_eq!(audits.list(false).await.unwrap().len(), 1);

        let archived = audits
            .apply_action(audit.id, AuditActionDto::Archive, AUDITOR)
            .await
            .unwrap();
        assert!(archived.archived);
        assert!(audits.list(false).await.unwrap().is_empty());
        assert_eq!(audits.list(true).await.unwrap().len(), 1);

        let restored = audits
            .apply_action(audit.id, AuditActionDto::Unarchive, AUDITOR)
            .await
            .unwrap();
        assert_eq!(restored.archived, audit.archived);
        assert_eq!(audits.list(false).await.unwrap().len(), 1);

        audits
            .apply_action(audit.id, AuditActionDto::ToggleHighlight, AUDITOR)
            .await
            .unwrap();
        let twice = audits
            .apply_action(audit.id, AuditActionDto::ToggleHighlight, AUDITOR)
            .await
            .unwrap();
        assert_eq!(twice.highlighted, audit.highlighted);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unknown_entry_link_is_rejected(pool: PgPool) {
        let audits = service(pool);

        let result = audits
            .create(
                CreateAuditDto {
                    document_ids: vec![Uuid::new_v4()],
                    ..new_audit("Broken links")
                },
                AUDITOR,
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(audits.list(true).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_removes_audit_from_cached_list(pool: PgPool) {
        let audits = service(pool);
        let audit = audits.create(new_audit("Short lived"), AUDITOR).await.unwrap();
        assert_eq!(audits.list(false).await.unwrap().len(), 1);

        audits.delete(audit.id).await.unwrap();

        assert!(audits.list(false).await.unwrap().is_empty());
        assert!(matches!(
            audits.get(audit.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
