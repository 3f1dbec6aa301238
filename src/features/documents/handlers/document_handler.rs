use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppPath;
use crate::features::auth::guards::{RequireDelete, RequireRead, RequireWrite};
use crate::features::documents::dtos::{
    DocumentResponseDto, IncomingFile, UploadDocumentsDto, UploadResultDto,
};
use crate::features::documents::models::RelatedEntityType;
use crate::features::documents::services::DocumentService;
use crate::shared::types::{ApiResponse, Meta};

/// Upload one or more documents
///
/// Accepts multipart/form-data with:
/// - `file`: repeated once per file (required)
/// - `title`: optional, used when a single file is sent
#[utoipa::path(
    post,
    path = "/api/documents/{entity_type}/{entity_id}",
    tag = "documents",
    params(
        ("entity_type" = RelatedEntityType, Path, description = "register_entry, audit or objective"),
        ("entity_id" = Uuid, Path, description = "Owner ID")
    ),
    request_body(
        content = UploadDocumentsDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Upload processed; rejected files are listed in `failed`", body = ApiResponse<UploadResultDto>),
        (status = 400, description = "No file or malformed form"),
        (status = 404, description = "Owner not found"),
        (status = 403, description = "Write permission required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_documents(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<DocumentService>>,
    AppPath((entity_type, entity_id)): AppPath<(RelatedEntityType, Uuid)>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadResultDto>>)> {
    let mut files = Vec::new();
    let mut title: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                files.push(IncomingFile {
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "title" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read title field: {}", e))
                })?;
                let text = text.trim();
                if !text.is_empty() {
                    title = Some(text.to_string());
                }
            }
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    let result = service
        .upload(entity_type, entity_id, title, files, &user.sub)
        .await?;

    let message = if result.failed.is_empty() {
        None
    } else {
        Some(format!("{} file(s) could not be uploaded", result.failed.len()))
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(result), message, None)),
    ))
}

/// List documents attached to an entry, audit or objective
#[utoipa::path(
    get,
    path = "/api/documents/{entity_type}/{entity_id}",
    tag = "documents",
    params(
        ("entity_type" = RelatedEntityType, Path, description = "register_entry, audit or objective"),
        ("entity_id" = Uuid, Path, description = "Owner ID")
    ),
    responses(
        (status = 200, description = "Documents, newest first", body = ApiResponse<Vec<DocumentResponseDto>>),
        (status = 403, description = "Read permission required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_documents(
    RequireRead(_user): RequireRead,
    State(service): State<Arc<DocumentService>>,
    AppPath((entity_type, entity_id)): AppPath<(RelatedEntityType, Uuid)>,
) -> Result<Json<ApiResponse<Vec<DocumentResponseDto>>>> {
    let documents = service.list(entity_type, entity_id).await?;
    let total = documents.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(documents),
        None,
        Some(Meta { total }),
    )))
}

/// Delete a document and its stored file
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document deleted"),
        (status = 404, description = "Document not found"),
        (status = 403, description = "Delete permission required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_document(
    RequireDelete(_user): RequireDelete,
    State(service): State<Arc<DocumentService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Document deleted".to_string()),
        None,
    )))
}
