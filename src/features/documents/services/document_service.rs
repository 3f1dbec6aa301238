use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::documents::dtos::{
    check_file, DocumentResponseDto, FailedUploadDto, IncomingFile, UploadResultDto,
};
use crate::features::documents::models::{Document, RelatedEntityType};
use crate::modules::storage::FileStore;

const DOCUMENT_COLUMNS: &str = "id, title, file_url, file_path, file_type, file_size, \
     uploaded_by, related_entity_type, related_entity_id, created_at";

/// Service for documents attached to entries, audits and objectives
pub struct DocumentService {
    pool: PgPool,
    store: Arc<dyn FileStore>,
    max_file_size: usize,
}

impl DocumentService {
    pub fn new(pool: PgPool, store: Arc<dyn FileStore>, max_file_size: usize) -> Self {
        Self {
            pool,
            store,
            max_file_size,
        }
    }

    async fn ensure_owner_exists(&self, entity_type: RelatedEntityType, id: Uuid) -> Result<()> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            entity_type.table()
        );
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if !exists {
            return Err(AppError::NotFound(format!(
                "{} with id {} not found",
                entity_type, id
            )));
        }
        Ok(())
    }

    /// Store each file and record it; failures are collected per file
    pub async fn upload(
        &self,
        entity_type: RelatedEntityType,
        entity_id: Uuid,
        title: Option<String>,
        files: Vec<IncomingFile>,
        uploaded_by: &str,
    ) -> Result<UploadResultDto> {
        if files.is_empty() {
            return Err(AppError::BadRequest("At least one file is required".to_string()));
        }
        self.ensure_owner_exists(entity_type, entity_id).await?;

        let single = files.len() == 1;
        let mut result = UploadResultDto::default();

        for file in files {
            let filename = file.filename.clone();
            let title = match (&title, single) {
                (Some(t), true) => t.clone(),
                _ => filename.clone(),
            };

            match self
                .store_one(entity_type, entity_id, &title, file, uploaded_by)
                .await
            {
                Ok(document) => result.uploaded.push(document),
                Err(reason) => {
                    warn!(
                        "Upload of '{}' to {} {} failed: {}",
                        filename, entity_type, entity_id, reason
                    );
                    result.failed.push(FailedUploadDto { filename, reason });
                }
            }
        }

        info!(
            "Uploaded {} document(s) to {} {} ({} failed)",
            result.uploaded.len(),
            entity_type,
            entity_id,
            result.failed.len()
        );
        Ok(result)
    }

    async fn store_one(
        &self,
        entity_type: RelatedEntityType,
        entity_id: Uuid,
        title: &str,
        file: IncomingFile,
        uploaded_by: &str,
    ) -> std::result::Result<DocumentResponseDto, String> {
        check_file(&file, self.max_file_size)?;

        let prefix = format!("{}/{}", entity_type, entity_id);
        let stored = self
            .store
            .save(&prefix, &file.filename, &file.content_type, file.data)
            .await
            .map_err(|e| e.to_string())?;

        let sql = format!(
            "INSERT INTO documents (title, file_url, file_path, file_type, file_size, \
             uploaded_by, related_entity_type, related_entity_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            DOCUMENT_COLUMNS
        );
        let inserted = sqlx::query_as::<_, Document>(&sql)
            .bind(title)
            .bind(&stored.url)
            .bind(&stored.path)
            .bind(&stored.mime_type)
            .bind(stored.size)
            .bind(uploaded_by)
            .bind(entity_type.as_str())
            .bind(entity_id)
            .fetch_one(&self.pool)
            .await;

        match inserted {
            Ok(document) => Ok(document.into()),
            Err(e) => {
                tracing::error!("Failed to record document {}: {:?}", stored.path, e);
                self.remove_files(vec![stored.path]).await;
                Err("Failed to record document".to_string())
            }
        }
    }

    pub async fn list(
        &self,
        entity_type: RelatedEntityType,
        entity_id: Uuid,
    ) -> Result<Vec<DocumentResponseDto>> {
        let sql = format!(
            "SELECT {} FROM documents \
             WHERE related_entity_type = $1 AND related_entity_id = $2 \
             ORDER BY created_at DESC",
            DOCUMENT_COLUMNS
        );
        let documents = sqlx::query_as::<_, Document>(&sql)
            .bind(entity_type.as_str())
            .bind(entity_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list documents: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    /// Delete the row, then the stored file
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let sql = format!(
            "DELETE FROM documents WHERE id = $1 RETURNING {}",
            DOCUMENT_COLUMNS
        );
        let document = sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Document with id {} not found", id)))?;

        info!(
            "Document {} ('{}') deleted from {} {}",
            id, document.title, document.related_entity_type, document.related_entity_id
        );
        self.remove_files(vec![document.file_path]).await;
        Ok(())
    }

    /// Delete the document rows of the given owners inside `tx`.
    ///
    /// Returns the storage paths; remove them with [`Self::remove_files`] once
    /// the transaction has committed.
    pub async fn detach_all(
        tx: &mut Transaction<'_, Postgres>,
        entity_type: RelatedEntityType,
        owner_ids: &[Uuid],
    ) -> Result<Vec<String>> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }

        let paths = sqlx::query_scalar::<_, String>(
            "DELETE FROM documents \
             WHERE related_entity_type = $1 AND related_entity_id = ANY($2) \
             RETURNING file_path",
        )
        .bind(entity_type.as_str())
        .bind(owner_ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        debug!(
            "Detached {} document(s) from {} {} owner(s)",
            paths.len(),
            owner_ids.len(),
            entity_type
        );
        Ok(paths)
    }

    /// Best effort; a file that cannot be removed is logged and left behind
    pub async fn remove_files(&self, paths: Vec<String>) {
        for path in paths {
            if let Err(e) = self.store.remove(&path).await {
                warn!("Failed to remove stored file {}: {}", path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::discard_documents;

    async fn seed_objective(pool: &PgPool) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO objectives (number, title, sort_order, created_by) \
             VALUES (1, 'Reduce waste', 0, 'seed') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn file(filename: &str, content_type: &str) -> IncomingFile {
        IncomingFile {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data: b"content".to_vec(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_removes_the_stored_file_of_that_row(pool: PgPool) {
        let objective = seed_objective(&pool).await;
        let (documents, store) = discard_documents(&pool);

        let result = documents
            .upload(
                RelatedEntityType::Objective,
                objective,
                Some("Waste plan".to_string()),
                vec![file("plan.pdf", "application/pdf")],
                "editor-1",
            )
            .await
            .unwrap();
        let uploaded = &result.uploaded[0];
        assert_eq!(uploaded.title, "Waste plan");

        documents.delete(uploaded.id).await.unwrap();

        assert_eq!(store.removed(), vec![format!("objective/{}/plan.pdf", objective)]);
        assert!(documents
            .list(RelatedEntityType::Objective, objective)
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            documents.delete(uploaded.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_upload_reports_refused_files_separately(pool: PgPool) {
        let objective = seed_objective(&pool).await;
        let (documents, _) = discard_documents(&pool);

        let result = documents
            .upload(
                RelatedEntityType::Objective,
                objective,
                Some("ignored for several files".to_string()),
                vec![
                    file("notes.txt", "text/plain"),
                    file("tool.exe", "application/x-msdownload"),
                ],
                "editor-1",
            )
            .await
            .unwrap();

        assert_eq!(result.uploaded.len(), 1);
        assert_eq!(result.uploaded[0].title, "notes.txt");
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].filename, "tool.exe");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_upload_to_missing_owner_is_not_found(pool: PgPool) {
        let (documents, _) = discard_documents(&pool);
        let result = documents
            .upload(
                RelatedEntityType::Audit,
                Uuid::new_v4(),
                None,
                vec![file("a.pdf", "application/pdf")],
                "editor-1",
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
