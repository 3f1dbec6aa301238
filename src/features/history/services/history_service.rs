use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::history::dtos::{
    CreateReviewDto, CreateVersionDto, ReviewResponseDto, VersionResponseDto,
};
use crate::features::history::models::{ReviewRecord, VersionRecord};
use crate::features::registry::models::RegisterKind;
use crate::shared::types::PaginationQuery;

const VERSION_COLUMNS: &str =
    "id, kind, section_id, number, version_date, details, author, created_by, created_at";

const REVIEW_COLUMNS: &str = "id, kind, section_id, reviewed_on, details, reviewer, \
     next_review_date, created_by, created_at";

/// Append-only version and review logs per register
pub struct HistoryService {
    pool: PgPool,
}

impl HistoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_section(&self, kind: RegisterKind, section_id: Option<Uuid>) -> Result<()> {
        let Some(section_id) = section_id else {
            return Ok(());
        };

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM register_sections WHERE id = $1 AND kind = $2)",
        )
        .bind(section_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if !exists {
            return Err(AppError::NotFound(format!(
                "Section with id {} not found",
                section_id
            )));
        }
        Ok(())
    }

    /// Newest first
    pub async fn list_versions(
        &self,
        kind: RegisterKind,
        section_id: Option<Uuid>,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<VersionResponseDto>, i64)> {
        let filter = "kind = $1 AND ($2::uuid IS NULL OR section_id = $2)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM register_versions WHERE {}",
            filter
        ))
        .bind(kind)
        .bind(section_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let sql = format!(
            "SELECT {} FROM register_versions WHERE {} \
             ORDER BY version_date DESC, created_at DESC LIMIT $3 OFFSET $4",
            VERSION_COLUMNS, filter
        );
        let records = sqlx::query_as::<_, VersionRecord>(&sql)
            .bind(kind)
            .bind(section_id)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list {} versions: {:?}", kind, e);
                AppError::Database(e)
            })?;

        Ok((records.into_iter().map(Into::into).collect(), total))
    }

    pub async fn append_version(
        &self,
        kind: RegisterKind,
        dto: CreateVersionDto,
        created_by: &str,
    ) -> Result<VersionResponseDto> {
        self.ensure_section(kind, dto.section_id).await?;

        let sql = format!(
            "INSERT INTO register_versions \
             (kind, section_id, number, version_date, details, author, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            VERSION_COLUMNS
        );
        let record = sqlx::query_as::<_, VersionRecord>(&sql)
            .bind(kind)
            .bind(dto.section_id)
            .bind(dto.number.trim())
            .bind(dto.version_date)
            .bind(&dto.details)
            .bind(dto.author.trim())
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)?;

        tracing::info!(
            "{} version {} logged by {}",
            kind,
            record.number,
            created_by
        );
        Ok(record.into())
    }

    /// Newest first
    pub async fn list_reviews(
        &self,
        kind: RegisterKind,
        section_id: Option<Uuid>,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<ReviewResponseDto>, i64)> {
        let filter = "kind = $1 AND ($2::uuid IS NULL OR section_id = $2)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM register_reviews WHERE {}",
            filter
        ))
        .bind(kind)
        .bind(section_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let sql = format!(
            "SELECT {} FROM register_reviews WHERE {} \
             ORDER BY reviewed_on DESC, created_at DESC LIMIT $3 OFFSET $4",
            REVIEW_COLUMNS, filter
        );
        let records = sqlx::query_as::<_, ReviewRecord>(&sql)
            .bind(kind)
            .bind(section_id)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list {} reviews: {:?}", kind, e);
                AppError::Database(e)
            })?;

        Ok((records.into_iter().map(Into::into).collect(), total))
    }

    pub async fn append_review(
        &self,
        kind: RegisterKind,
        dto: CreateReviewDto,
        created_by: &str,
    ) -> Result<ReviewResponseDto> {
        self.ensure_section(kind, dto.section_id).await?;

        let sql = format!(
            "INSERT INTO register_reviews \
             (kind, section_id, reviewed_on, details, reviewer, next_review_date, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            REVIEW_COLUMNS
        );
        let record = sqlx::query_as::<_, ReviewRecord>(&sql)
            .bind(kind)
            .bind(dto.section_id)
            .bind(dto.reviewed_on)
            .bind(&dto.details)
            .bind(dto.reviewer.trim())
            .bind(dto.next_review_date)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)?;

        tracing::info!(
            "{} review of {} logged by {}",
            kind,
            record.reviewed_on,
            created_by
        );
        Ok(record.into())
    }
}
