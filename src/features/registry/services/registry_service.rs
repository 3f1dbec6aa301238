use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::TreeCache;
use crate::core::error::{AppError, Result};
use crate::features::audits::AuditCache;
use crate::features::documents::models::RelatedEntityType;
use crate::features::documents::DocumentService;
use crate::features::registry::dtos::{
    CategoryActionDto, CategoryOptionDto, CategoryResponseDto, CreateCategoryDto,
    CreateSectionDto, SectionOptionDto, SectionResponseDto, SectionTreeDto,
    UpdateCategoryDto, UpdateSectionDto,
};
use crate::features::registry::models::{Category, Entry, RegisterKind, Section};
use crate::shared::constants::AUDITS_CACHE_KEY;
use crate::shared::ordering::ReorderTarget;
use crate::shared::sortable::{Flag, SortableTable};

pub(super) const SECTION_COLUMNS: &str = "id, kind, title, sort_order, created_at, updated_at";

pub(super) const CATEGORY_COLUMNS: &str = "id, kind, section_id, title, highlighted, archived, \
     sort_order, created_by, updated_by, created_at, updated_at";

pub(super) const ENTRY_COLUMNS: &str = "id, kind, category_id, title, reference, version, owner, \
     issue_date, review_date, status, details, approved, highlighted, archived, sort_order, \
     created_by, updated_by, created_at, updated_at";

const CATEGORIES: SortableTable =
    SortableTable::new("register_categories", Some("section_id"), "Category");

/// Sections, categories and the nested register tree
pub struct RegistryService {
    pool: PgPool,
    cache: Arc<TreeCache>,
    audit_cache: Arc<AuditCache>,
    documents: Arc<DocumentService>,
}

impl RegistryService {
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

    // =========================================================================
    // TREE
    // =========================================================================

    /// Sections -> categories -> entries, each level in `sort_order`.
    ///
    /// The three levels are read from one snapshot.
    pub async fn list_tree(
        &self,
        kind: RegisterKind,
        include_archived: bool,
    ) -> Result<Vec<SectionTreeDto>> {
        let cache_key = kind.cache_key();
        if !include_archived {
            if let Some(tree) = self.cache.get(&cache_key).await {
                tracing::debug!("Serving {} tree from cache", kind);
                return Ok(tree);
            }
        }
        let generation = self.cache.generation(&cache_key).await;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let sections = Self::fetch_sections(&mut *tx, kind).await?;

        let sql = format!(
            "SELECT {} FROM register_categories \
             WHERE kind = $1 AND ($2 OR archived = FALSE) \
             ORDER BY sort_order, created_at",
            CATEGORY_COLUMNS
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(kind)
            .bind(include_archived)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list {} categories: {:?}", kind, e);
                AppError::Database(e)
            })?;

        let sql = format!(
            "SELECT {} FROM register_entries \
             WHERE kind = $1 AND ($2 OR archived = FALSE) \
             ORDER BY sort_order, created_at",
            ENTRY_COLUMNS
        );
        let entries = sqlx::query_as::<_, Entry>(&sql)
            .bind(kind)
            .bind(include_archived)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list {} entries: {:?}", kind, e);
                AppError::Database(e)
            })?;

        tx.commit().await.map_err(AppError::Database)?;

        let tree = SectionTreeDto::build_tree(sections, categories, entries);

        if !include_archived {
            self.cache
                .put_if_generation(&cache_key, generation, tree.clone())
                .await;
        }
        Ok(tree)
    }

    pub(super) async fn invalidate(&self, kind: RegisterKind) {
        self.cache.invalidate(&kind.cache_key()).await;
    }

    // =========================================================================
    // SECTIONS
    // =========================================================================

    async fn fetch_sections<'e, E>(executor: E, kind: RegisterKind) -> Result<Vec<Section>>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let sql = format!(
            "SELECT {} FROM register_sections WHERE kind = $1 ORDER BY sort_order, created_at",
            SECTION_COLUMNS
        );
        sqlx::query_as::<_, Section>(&sql)
            .bind(kind)
            .fetch_all(executor)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list {} sections: {:?}", kind, e);
                AppError::Database(e)
            })
    }

    /// Sections with their active categories, for choosing a move destination
    pub async fn list_sections(&self, kind: RegisterKind) -> Result<Vec<SectionOptionDto>> {
        let sections = Self::fetch_sections(&self.pool, kind).await?;

        let categories: Vec<(Uuid, Uuid, String)> = sqlx::query_as(
            "SELECT id, section_id, title FROM register_categories \
             WHERE kind = $1 AND archived = FALSE \
             ORDER BY sort_order, created_at",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(sections
            .into_iter()
            .map(|s| SectionOptionDto {
                categories: categories
                    .iter()
                    .filter(|(_, section_id, _)| *section_id == s.id)
                    .map(|(id, _, title)| CategoryOptionDto {
                        id: *id,
                        title: title.clone(),
                    })
                    .collect(),
                id: s.id,
                title: s.title,
            })
            .collect())
    }

    pub async fn get_section(&self, kind: RegisterKind, id: Uuid) -> Result<Section> {
        let sql = format!(
            "SELECT {} FROM register_sections WHERE id = $1 AND kind = $2",
            SECTION_COLUMNS
        );
        sqlx::query_as::<_, Section>(&sql)
            .bind(id)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Section with id {} not found", id)))
    }

    pub async fn create_section(
        &self,
        kind: RegisterKind,
        dto: CreateSectionDto,
    ) -> Result<SectionResponseDto> {
        let sql = format!(
            "INSERT INTO register_sections (kind, title, sort_order) \
             VALUES ($1, $2, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM register_sections WHERE kind = $1)) \
             RETURNING {}",
            SECTION_COLUMNS
        );
        let section = sqlx::query_as::<_, Section>(&sql)
            .bind(kind)
            .bind(dto.title.trim())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)?;

        tracing::info!("Section {} created in {}", section.id, kind);
        self.invalidate(kind).await;
        Ok(section.into())
    }

    pub async fn update_section(
        &self,
        kind: RegisterKind,
        id: Uuid,
        dto: UpdateSectionDto,
    ) -> Result<SectionResponseDto> {
        let sql = format!(
            "UPDATE register_sections SET title = $1, updated_at = NOW() \
             WHERE id = $2 AND kind = $3 RETURNING {}",
            SECTION_COLUMNS
        );
        let section = sqlx::query_as::<_, Section>(&sql)
            .bind(dto.title.trim())
            .bind(id)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)?
            .ok_or_else(|| AppError::NotFound(format!("Section with id {} not found", id)))?;

        self.invalidate(kind).await;
        Ok(section.into())
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    pub async fn get_category(&self, kind: RegisterKind, id: Uuid) -> Result<Category> {
        let sql = format!(
            "SELECT {} FROM register_categories WHERE id = $1 AND kind = $2",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }

    /// New categories start active, unhighlighted, at the end of their section
    pub async fn create_category(
        &self,
        kind: RegisterKind,
        dto: CreateCategoryDto,
        created_by: &str,
    ) -> Result<CategoryResponseDto> {
        self.get_section(kind, dto.section_id).await?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let sort_order = CATEGORIES
            .next_sort_order(&mut *tx, Some(dto.section_id))
            .await?;

        let sql = format!(
            "INSERT INTO register_categories (kind, section_id, title, sort_order, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            CATEGORY_COLUMNS
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(kind)
            .bind(dto.section_id)
            .bind(dto.title.trim())
            .bind(sort_order)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from_db)?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Category {} created in {} section {} by {}",
            category.id,
            kind,
            dto.section_id,
            created_by
        );
        self.invalidate(kind).await;
        Ok(category.into())
    }

    pub async fn update_category(
        &self,
        kind: RegisterKind,
        id: Uuid,
        dto: UpdateCategoryDto,
        updated_by: &str,
    ) -> Result<CategoryResponseDto> {
        let sql = format!(
            "UPDATE register_categories SET title = $1, updated_by = $2, updated_at = NOW() \
             WHERE id = $3 AND kind = $4 RETURNING {}",
            CATEGORY_COLUMNS
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(dto.title.trim())
            .bind(updated_by)
            .bind(id)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))?;

        self.invalidate(kind).await;
        Ok(category.into())
    }

    /// Apply a PATCH action and return the category as it now stands
    pub async fn apply_category_action(
        &self,
        kind: RegisterKind,
        id: Uuid,
        action: CategoryActionDto,
        user: &str,
    ) -> Result<CategoryResponseDto> {
        self.get_category(kind, id).await?;

        match action {
            CategoryActionDto::Reorder(target) => {
                match target.resolve().map_err(AppError::Validation)? {
                    ReorderTarget::Step(direction) => {
                        CATEGORIES
                            .swap_with_neighbor(&self.pool, id, direction)
                            .await?;
                    }
                    ReorderTarget::Position(position) => {
                        CATEGORIES
                            .move_to_position(&self.pool, id, position)
                            .await?;
                    }
                }
            }
            CategoryActionDto::ToggleHighlight => {
                CATEGORIES
                    .toggle_flag(&self.pool, id, Flag::Highlighted, user)
                    .await?;
            }
            CategoryActionDto::Archive => {
                CATEGORIES
                    .set_flag(&self.pool, id, Flag::Archived, true, user)
                    .await?;
            }
            CategoryActionDto::Unarchive => {
                CATEGORIES
                    .set_flag(&self.pool, id, Flag::Archived, false, user)
                    .await?;
            }
        }

        self.invalidate(kind).await;
        Ok(self.get_category(kind, id).await?.into())
    }

    /// Give the section's categories a new order; unlisted ones follow
    pub async fn reorder_categories(
        &self,
        kind: RegisterKind,
        section_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> Result<Vec<Uuid>> {
        self.get_section(kind, section_id).await?;

        let plan = CATEGORIES
            .assign_sequence(&self.pool, Some(section_id), ordered_ids)
            .await?;

        self.invalidate(kind).await;
        Ok(plan)
    }

    /// Delete a category with its entries and their documents
    pub async fn delete_category(&self, kind: RegisterKind, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM register_categories WHERE id = $1 AND kind = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(kind)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("Category with id {} not found", id)));
        }

        let entry_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM register_entries WHERE category_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let paths =
            DocumentService::detach_all(&mut tx, RelatedEntityType::RegisterEntry, &entry_ids)
                .await?;

        sqlx::query("DELETE FROM register_categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Category {} deleted with {} entries and {} documents",
            id,
            entry_ids.len(),
            paths.len()
        );
        self.invalidate(kind).await;
        self.audit_cache.invalidate(AUDITS_CACHE_KEY).await;
        self.documents.remove_files(paths).await;
        Ok(())
    }
}
