use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::documents::models::RelatedEntityType;
use crate::features::documents::DocumentService;
use crate::features::objectives::dtos::{
    CreateObjectiveDto, ObjectiveActionDto, ObjectiveResponseDto, UpdateObjectiveDto,
};
use crate::features::objectives::models::Objective;
use crate::shared::cache::ListCache;
use crate::shared::constants::OBJECTIVES_CACHE_KEY;
use crate::shared::ordering::ReorderTarget;
use crate::shared::sortable::{Flag, SortableTable};

const OBJECTIVE_COLUMNS: &str = "id, number, title, description, target, owner, due_date, \
     status, progress_notes, highlighted, archived, sort_order, created_by, updated_by, \
     created_at, updated_at";

const OBJECTIVES: SortableTable = SortableTable::new("objectives", None, "Objective");

/// Service for quality objectives (one global ordered list)
pub struct ObjectiveService {
    pool: PgPool,
    cache: Arc<ListCache<Vec<ObjectiveResponseDto>>>,
    documents: Arc<DocumentService>,
}

impl ObjectiveService {
    pub fn new(
        pool: PgPool,
        cache: Arc<ListCache<Vec<ObjectiveResponseDto>>>,
        documents: Arc<DocumentService>,
    ) -> Self {
        Self {
            pool,
            cache,
            documents,
        }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Objective with id {} not found", id))
    }

    async fn invalidate(&self) {
        self.cache.invalidate(OBJECTIVES_CACHE_KEY).await;
    }

    pub async fn list(&self, include_archived: bool) -> Result<Vec<ObjectiveResponseDto>> {
        if !include_archived {
            if let Some(objectives) = self.cache.get(OBJECTIVES_CACHE_KEY).await {
                return Ok(objectives);
            }
        }
        let generation = self.cache.generation(OBJECTIVES_CACHE_KEY).await;

        let sql = format!(
            "SELECT {} FROM objectives WHERE ($1 OR archived = FALSE) \
             ORDER BY sort_order, created_at",
            OBJECTIVE_COLUMNS
        );
        let objectives: Vec<ObjectiveResponseDto> = sqlx::query_as::<_, Objective>(&sql)
            .bind(include_archived)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list objectives: {:?}", e);
                AppError::Database(e)
            })?
            .into_iter()
            .map(Into::into)
            .collect();

        if !include_archived {
            self.cache
                .put_if_generation(OBJECTIVES_CACHE_KEY, generation, objectives.clone())
                .await;
        }
        Ok(objectives)
    }

    pub async fn get(&self, id: Uuid) -> Result<ObjectiveResponseDto> {
        let sql = format!("SELECT {} FROM objectives WHERE id = $1", OBJECTIVE_COLUMNS);
        sqlx::query_as::<_, Objective>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .map(Into::into)
            .ok_or_else(|| Self::not_found(id))
    }

    /// `number` is `max + 1` without a lock, like audits
    pub async fn create(
        &self,
        dto: CreateObjectiveDto,
        created_by: &str,
    ) -> Result<ObjectiveResponseDto> {
        let number =
            sqlx::query_scalar::<_, i32>("SELECT COALESCE(MAX(number), 0) + 1 FROM objectives")
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let sort_order = OBJECTIVES.next_sort_order(&mut *tx, None).await?;

        let sql = format!(
            "INSERT INTO objectives \
             (number, title, description, target, owner, due_date, status, progress_notes, \
              sort_order, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            OBJECTIVE_COLUMNS
        );
        let objective = sqlx::query_as::<_, Objective>(&sql)
            .bind(number)
            .bind(dto.title.trim())
            .bind(&dto.description)
            .bind(&dto.target)
            .bind(&dto.owner)
            .bind(dto.due_date)
            .bind(dto.status)
            .bind(&dto.progress_notes)
            .bind(sort_order)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from_db)?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Objective #{} ({}) created by {}",
            objective.number,
            objective.id,
            created_by
        );
        self.invalidate().await;
        Ok(objective.into())
    }

    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateObjectiveDto,
        updated_by: &str,
    ) -> Result<ObjectiveResponseDto> {
        let sql = format!(
            "UPDATE objectives SET \
               title = COALESCE($1, title), \
               description = COALESCE($2, description), \
               target = COALESCE($3, target), \
               owner = COALESCE($4, owner), \
               due_date = COALESCE($5, due_date), \
               status = COALESCE($6, status), \
               progress_notes = COALESCE($7, progress_notes), \
               updated_by = $8, \
               updated_at = NOW() \
             WHERE id = $9 \
             RETURNING {}",
            OBJECTIVE_COLUMNS
        );
        let objective = sqlx::query_as::<_, Objective>(&sql)
            .bind(dto.title.as_deref().map(str::trim))
            .bind(&dto.description)
            .bind(&dto.target)
            .bind(&dto.owner)
            .bind(dto.due_date)
            .bind(dto.status)
            .bind(&dto.progress_notes)
            .bind(updated_by)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)?
            .ok_or_else(|| Self::not_found(id))?;

        tracing::info!("Objective {} updated by {}", id, updated_by);
        self.invalidate().await;
        Ok(objective.into())
    }

    pub async fn apply_action(
        &self,
        id: Uuid,
        action: ObjectiveActionDto,
        user: &str,
    ) -> Result<ObjectiveResponseDto> {
        match action {
            ObjectiveActionDto::Reorder(target) => {
                match target.resolve().map_err(AppError::Validation)? {
                    ReorderTarget::Step(direction) => {
                        OBJECTIVES
                            .swap_with_neighbor(&self.pool, id, direction)
                            .await?;
                    }
                    ReorderTarget::Position(position) => {
                        OBJECTIVES
                            .move_to_position(&self.pool, id, position)
                            .await?;
                    }
                }
            }
            ObjectiveActionDto::ToggleHighlight => {
                OBJECTIVES
                    .toggle_flag(&self.pool, id, Flag::Highlighted, user)
                    .await?;
            }
            ObjectiveActionDto::Archive => {
                OBJECTIVES
                    .set_flag(&self.pool, id, Flag::Archived, true, user)
                    .await?;
            }
            ObjectiveActionDto::Unarchive => {
                OBJECTIVES
                    .set_flag(&self.pool, id, Flag::Archived, false, user)
                    .await?;
            }
        }

        self.invalidate().await;
        self.get(id).await
    }

    pub async fn reorder(&self, ordered_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let plan = OBJECTIVES
            .assign_sequence(&self.pool, None, ordered_ids)
            .await?;
        self.invalidate().await;
        Ok(plan)
    }

    /// Delete an objective and its documents
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let deleted = sqlx::query("DELETE FROM objectives WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if deleted.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }

        let paths =
            DocumentService::detach_all(&mut tx, RelatedEntityType::Objective, &[id]).await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!("Objective {} deleted with {} documents", id, paths.len());
        self.invalidate().await;
        self.documents.remove_files(paths).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::documents::dtos::IncomingFile;
    use crate::features::objectives::models::ObjectiveStatus;
    use crate::shared::ordering::ReorderTargetDto;
    use crate::shared::test_helpers::discard_documents;
    use chrono::NaiveDate;
    use std::time::Duration;

    const OWNER: &str = "editor-1";

    fn service(pool: PgPool) -> (ObjectiveService, Arc<DocumentService>) {
        let (documents, _) = discard_documents(&pool);
        let objectives = ObjectiveService::new(
            pool,
            Arc::new(ListCache::new(Duration::from_secs(60))),
            Arc::clone(&documents),
        );
        (objectives, documents)
    }

    fn new_objective(title: &str) -> CreateObjectiveDto {
        CreateObjectiveDto {
            title: title.to_string(),
            description: None,
            target: None,
            owner: None,
            due_date: None,
            status: ObjectiveStatus::NotStarted,
            progress_notes: None,
        }
    }

    async fn titles(objectives: &ObjectiveService) -> Vec<String> {
        objectives
            .list(false)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.title)
            .collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_created_objective_keeps_submitted_fields(pool: PgPool) {
        let (objectives, _) = service(pool);

        let objective = objectives
            .create(
                CreateObjectiveDto {
                    description: Some("Fewer late deliveries".to_string()),
                    target: Some("95% on time".to_string()),
                    owner: Some("Logistics".to_string()),
                    due_date: NaiveDate::from_ymd_opt(2026, 12, 31),
                    status: ObjectiveStatus::InProgress,
                    progress_notes: Some("Q1 at 91%".to_string()),
                    ..new_objective("On-time delivery")
                },
                OWNER,
            )
            .await
            .unwrap();

        assert_eq!(objective.number, 1);
        assert_eq!(objective.title, "On-time delivery");
        assert_eq!(objective.description.as_deref(), Some("Fewer late deliveries"));
        assert_eq!(objective.target.as_deref(), Some("95% on time"));
        assert_eq!(objective.owner.as_deref(), Some("Logistics"));
        assert_eq!(objective.due_date, NaiveDate::from_ymd_opt(2026, 12, 31));
        assert_eq!(objective.status, ObjectiveStatus::InProgress);
        assert_eq!(objective.progress_notes.as_deref(), Some("Q1 at 91%"));
        assert_eq!(objective.created_by, OWNER);

        let second = objectives.create(new_objective("Scrap rate"), OWNER).await.unwrap();
        assert_eq!(second.number, 2);
        assert!(second.sort_order > objective.sort_order);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_reorder_then_list_returns_requested_sequence(pool: PgPool) {
        let (objectives, _) = service(pool);
        let mut ids = Vec::new();
        for title in ["one", "two", "three"] {
            ids.push(objectives.create(new_objective(title), OWNER).await.unwrap().id);
        }
        assert_eq!(titles(&objectives).await, vec!["one", "two", "three"]);

        objectives.reorder(&[ids[2], ids[0], ids[1]]).await.unwrap();
        assert_eq!(titles(&objectives).await, vec!["three", "one", "two"]);

        let to_end = ObjectiveActionDto::Reorder(ReorderTargetDto {
            direction: None,
            position: Some(2),
        });
        objectives.apply_action(ids[2], to_end, OWNER).await.unwrap();
        assert_eq!(titles(&objectives).await, vec!["one", "two", "three"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_archive_unarchive_and_highlight_round_trip(pool: PgPool) {
        let (objectives, _) = service(pool);
        let objective = objectives.create(new_objective("Energy use"), OWNER).await.unwrap();

        objectives
            .apply_action(objective.id, ObjectiveActionDto::Archive, OWNER)
            .await
            .unwrap();
        assert!(titles(&objectives).await.is_empty());

        let restored = objectives
            .apply_action(objective.id, ObjectiveActionDto::Unarchive, OWNER)
            .await
            .unwrap();
        assert_eq!(restored.archived, objective.archived);
        assert_eq!(titles(&objectives).await, vec!["Energy use"]);

        objectives
            .apply_action(objective.id, ObjectiveActionDto::ToggleHighlight, OWNER)
            .await
            .unwrap();
        let twice = objectives
            .apply_action(objective.id, ObjectiveActionDto::ToggleHighlight, OWNER)
            .await
            .unwrap();
        assert_eq!(twice.highlighted, objective.highlighted);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_keeps_omitted_fields(pool: PgPool) {
        let (objectives, _) = service(pool);
        let objective = objectives
            .create(
                CreateObjectiveDto {
                    target: Some("Zero lost-time injuries".to_string()),
                    ..new_objective("Safety")
                },
                OWNER,
            )
            .await
            .unwrap();

        let updated = objectives
            .update(
                objective.id,
                UpdateObjectiveDto {
                    status: Some(ObjectiveStatus::Achieved),
                    ..Default::default()
                },
                OWNER,
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ObjectiveStatus::Achieved);
        assert_eq!(updated.target.as_deref(), Some("Zero lost-time injuries"));
        assert_eq!(titles(&objectives).await, vec!["Safety"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_detaches_documents(pool: PgPool) {
        let (objectives, documents) = service(pool);
        let objective = objectives.create(new_objective("Waste"), OWNER).await.unwrap();

        let file = IncomingFile {
            filename: "plan.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: b"%PDF-1.4".to_vec(),
        };
        let uploaded = documents
            .upload(RelatedEntityType::Objective, objective.id, None, vec![file], OWNER)
            .await
            .unwrap();
        assert_eq!(uploaded.uploaded.len(), 1);

        objectives.delete(objective.id).await.unwrap();

        assert!(documents
            .list(RelatedEntityType::Objective, objective.id)
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            objectives.get(objective.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
