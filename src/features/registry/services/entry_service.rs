use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::registry_service::ENTRY_COLUMNS;
use super::TreeCache;
use crate::core::error::{AppError, Result};
use crate::features::audits::AuditCache;
use crate::features::documents::models::RelatedEntityType;
use crate::features::documents::DocumentService;
use crate::features::registry::dtos::{
    CreateEntryDto, EntryActionDto, EntryResponseDto, MoveEntryDto, UpdateEntryDto,
};
use crate::features::registry::models::{Entry, RegisterKind};
use crate::shared::constants::AUDITS_CACHE_KEY;
use crate::shared::ordering::ReorderTarget;
use crate::shared::sortable::{Flag, SortableTable};
use crate::shared::validation::CONTROL_REF_REGEX;

const ENTRIES: SortableTable = SortableTable::new("register_entries", Some("category_id"), "Entry");

/// Check `reference` against the rules of the register.
///
/// `required` is true on create; updates may leave the reference untouched.
pub fn check_reference(kind: RegisterKind, reference: Option<&str>, required: bool) -> Result<()> {
    if !kind.requires_reference() {
        return Ok(());
    }

    match reference.map(str::trim) {
        None if required => Err(AppError::Validation(
            "reference is required for statement of applicability controls".to_string(),
        )),
        None => Ok(()),
        Some(r) if CONTROL_REF_REGEX.is_match(r) => Ok(()),
        Some(r) => Err(AppError::Validation(format!(
            "reference '{}' is not a control reference such as 'A.5.1'",
            r
        ))),
    }
}

/// Register entries of every kind
pub struct EntryService {
    pool: PgPool,
    cache: Arc<TreeCache>,
    audit_cache: Arc<AuditCache>,
    documents: Arc<DocumentService>,
}

impl EntryService {
    pub fn new(
        pool: PgPool,
        cache: Arc<TreeCache>,
        audit_cache: Arc<AuditCache>,
        documents: Arc<DocumentService>,
    ) -> Self {
        Self {
            pool,
            cache,
            audit_cache,
            documents,
        }
    }

    /// Drop the register tree and the audit list, which shows linked entries
    /// by title and reference in entry order
    async fn invalidate(&self, kind: RegisterKind) {
        self.cache.invalidate(&kind.cache_key()).await;
        self.audit_cache.invalidate(AUDITS_CACHE_KEY).await;
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Entry with id {} not found", id))
    }

    async fn fetch(&self, kind: RegisterKind, id: Uuid) -> Result<Entry> {
        let sql = format!(
            "SELECT {} FROM register_entries WHERE id = $1 AND kind = $2",
            ENTRY_COLUMNS
        );
        sqlx::query_as::<_, Entry>(&sql)
            .bind(id)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn get(&self, kind: RegisterKind, id: Uuid) -> Result<EntryResponseDto> {
        Ok(self.fetch(kind, id).await?.into())
    }

    async fn ensure_category(&self, kind: RegisterKind, category_id: Uuid) -> Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT section_id FROM register_categories WHERE id = $1 AND kind = $2",
        )
        .bind(category_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", category_id)))
    }

    /// New entries start active and unapproved, at the end of their category
    pub async fn create(
        &self,
        kind: RegisterKind,
        dto: CreateEntryDto,
        created_by: &str,
    ) -> Result<EntryResponseDto> {
        check_reference(kind, dto.reference.as_deref(), true)?;
        self.ensure_category(kind, dto.category_id).await?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let sort_order = ENTRIES
            .next_sort_order(&mut *tx, Some(dto.category_id))
            .await?;

        let sql = format!(
            "INSERT INTO register_entries \
             (kind, category_id, title, reference, version, owner, issue_date, review_date, \
              status, details, sort_order, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {}",
            ENTRY_COLUMNS
        );
        let entry = sqlx::query_as::<_, Entry>(&sql)
            .bind(kind)
            .bind(dto.category_id)
            .bind(dto.title.trim())
            .bind(dto.reference.as_deref().map(str::trim))
            .bind(&dto.version)
            .bind(&dto.owner)
            .bind(dto.issue_date)
            .bind(dto.review_date)
            .bind(&dto.status)
            .bind(dto.details.unwrap_or_else(|| serde_json::json!({})))
            .bind(sort_order)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from_db)?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "{} entry {} created in category {} by {}",
            kind,
            entry.id,
            entry.category_id,
            created_by
        );
        self.invalidate(kind).await;
        Ok(entry.into())
    }

    /// Overwrite the supplied fields; omitted fields keep their value
    pub async fn update(
        &self,
        kind: RegisterKind,
        id: Uuid,
        dto: UpdateEntryDto,
        updated_by: &str,
    ) -> Result<EntryResponseDto> {
        check_reference(kind, dto.reference.as_deref(), false)?;

        let sql = format!(
            "UPDATE register_entries SET \
               title = COALESCE($1, title), \
               reference = COALESCE($2, reference), \
               version = COALESCE($3, version), \
               owner = COALESCE($4, owner), \
               issue_date = COALESCE($5, issue_date), \
               review_date = COALESCE($6, review_date), \
               status = COALESCE($7, status), \
               details = COALESCE($8, details), \
               updated_by = $9, \
               updated_at = NOW() \
             WHERE id = $10 AND kind = $11 \
             RETURNING {}",
            ENTRY_COLUMNS
        );
        let entry = sqlx::query_as::<_, Entry>(&sql)
            .bind(dto.title.as_deref().map(str::trim))
            .bind(dto.reference.as_deref().map(str::trim))
            .bind(&dto.version)
            .bind(&dto.owner)
            .bind(dto.issue_date)
            .bind(dto.review_date)
            .bind(&dto.status)
            .bind(&dto.details)
            .bind(updated_by)
            .bind(id)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)?
            .ok_or_else(|| Self::not_found(id))?;

        tracing::info!("{} entry {} updated by {}", kind, id, updated_by);
        self.invalidate(kind).await;
        Ok(entry.into())
    }

    /// Apply a PATCH action and return the entry as it now stands
    pub async fn apply_action(
        &self,
        kind: RegisterKind,
        id: Uuid,
        action: EntryActionDto,
        user: &str,
    ) -> Result<EntryResponseDto> {
        self.fetch(kind, id).await?;

        match action {
            EntryActionDto::Reorder(target) => {
                match target.resolve().map_err(AppError::Validation)? {
                    ReorderTarget::Step(direction) => {
                        ENTRIES.swap_with_neighbor(&self.pool, id, direction).await?;
                    }
                    ReorderTarget::Position(position) => {
                        ENTRIES.move_to_position(&self.pool, id, position).await?;
                    }
                }
            }
            EntryActionDto::ToggleHighlight => {
                ENTRIES
                    .toggle_flag(&self.pool, id, Flag::Highlighted, user)
                    .await?;
            }
            EntryActionDto::Approve => {
                ENTRIES
                    .set_flag(&self.pool, id, Flag::Approved, true, user)
                    .await?;
            }
            EntryActionDto::Unapprove => {
                ENTRIES
                    .set_flag(&self.pool, id, Flag::Approved, false, user)
                    .await?;
            }
            EntryActionDto::Archive => {
                ENTRIES
                    .set_flag(&self.pool, id, Flag::Archived, true, user)
                    .await?;
            }
            EntryActionDto::Unarchive => {
                ENTRIES
                    .set_flag(&self.pool, id, Flag::Archived, false, user)
                    .await?;
            }
        }

        self.invalidate(kind).await;
        self.get(kind, id).await
    }

    /// Give a category's entries a new order; unlisted ones follow
    pub async fn reorder(
        &self,
        kind: RegisterKind,
        category_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> Result<Vec<Uuid>> {
        self.ensure_category(kind, category_id).await?;

        let plan = ENTRIES
            .assign_sequence(&self.pool, Some(category_id), ordered_ids)
            .await?;

        self.invalidate(kind).await;
        Ok(plan)
    }

    /// Move an entry to the end of another category of the same register
    pub async fn move_entry(
        &self,
        kind: RegisterKind,
        id: Uuid,
        dto: MoveEntryDto,
        updated_by: &str,
    ) -> Result<EntryResponseDto> {
        let section_id = self.ensure_category(kind, dto.category_id).await?;
        if section_id != dto.section_id {
            return Err(AppError::Validation(format!(
                "Category {} does not belong to section {}",
                dto.category_id, dto.section_id
            )));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let current = sqlx::query_scalar::<_, Uuid>(
            "SELECT category_id FROM register_entries WHERE id = $1 AND kind = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(kind)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| Self::not_found(id))?;

        if current != dto.category_id {
            let sort_order = ENTRIES
                .next_sort_order(&mut *tx, Some(dto.category_id))
                .await?;

            sqlx::query(
                "UPDATE register_entries \
                 SET category_id = $1, sort_order = $2, updated_by = $3, updated_at = NOW() \
                 WHERE id = $4",
            )
            .bind(dto.category_id)
            .bind(sort_order)
            .bind(updated_by)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "{} entry {} moved from category {} to {} by {}",
            kind,
            id,
            current,
            dto.category_id,
            updated_by
        );
        self.invalidate(kind).await;
        self.get(kind, id).await
    }

    /// Delete an entry and its documents
    pub async fn delete(&self, kind: RegisterKind, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let deleted = sqlx::query(
            "DELETE FROM register_entries WHERE id = $1 AND kind = $2",
        )
        .bind(id)
        .bind(kind)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        if deleted.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }

        let paths =
            DocumentService::detach_all(&mut tx, RelatedEntityType::RegisterEntry, &[id]).await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!("{} entry {} deleted with {} documents", kind, id, paths.len());
        self.invalidate(kind).await;
        self.documents.remove_files(paths).await;
        Ok(())
    }
}
