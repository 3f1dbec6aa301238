use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::documents::models::Document;

/// Multipart form for uploads.
/// Note: only used for Swagger UI; the handler reads the multipart stream directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentsDto {
    /// One or more files, each sent as a `file` part
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: Vec<String>,
    /// Title for a single upload; defaults to the file name
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponseDto {
    pub id: Uuid,
    pub title: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: String,
    pub related_entity_type: String,
    pub related_entity_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponseDto {
    fn from(d: Document) -> Self {
        Self {
            id: d.id,
            title: d.title,
            file_url: d.file_url,
            file_type: d.file_type,
            file_size: d.file_size,
            uploaded_by: d.uploaded_by,
            related_entity_type: d.related_entity_type,
            related_entity_id: d.related_entity_id,
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FailedUploadDto {
    pub filename: String,
    pub reason: String,
}

/// Outcome of a multi-file upload; one bad file does not sink the others
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UploadResultDto {
    pub uploaded: Vec<DocumentResponseDto>,
    pub failed: Vec<FailedUploadDto>,
}

/// A file part read from the multipart body
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Office documents, plain text and common images
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "text/csv",
    "image/jpeg",
    "image/png",
];

pub fn is_mime_type_allowed(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}

/// Reason a file is refused, if any
pub fn check_file(file: &IncomingFile, max_file_size: usize) -> Result<(), String> {
    if file.data.is_empty() {
        return Err("File is empty".to_string());
    }
    if file.data.len() > max_file_size {
        return Err(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_file_size / 1024 / 1024
        ));
    }
    if !is_mime_type_allowed(&file.content_type) {
        return Err(format!("File type '{}' is not allowed", file.content_type));
    }
    Ok(())
}
