//! Local-disk `FileStore`

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use super::{FileStore, StoredFile};
use crate::core::config::StorageConfig;
use crate::core::error::AppError;

pub struct LocalFileStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStore {
    /// Create the store, making sure the upload directory exists
    pub async fn new(config: &StorageConfig) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .map_err(|e| {
                AppError::Internal(format!(
                    "Failed to create upload directory {}: {}",
                    config.upload_dir.display(),
                    e
                ))
            })?;

        info!(
            "Local file store at {} served under {}",
            config.upload_dir.display(),
            config.public_base_url
        );

        Ok(Self {
            root: config.upload_dir.clone(),
            public_base_url: config.public_base_url.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build `{prefix}/{uuid}.{extension}`
    fn generate_key(prefix: &str, original_filename: &str, content_type: &str) -> String {
        let extension = extension_for(content_type)
            .map(str::to_string)
            .or_else(|| {
                Path::new(original_filename)
                    .extension()
                    .and_then(|e| e.to_str())
                    .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
                    .map(|e| e.to_ascii_lowercase())
            })
            .unwrap_or_else(|| "bin".to_string());

        format!("{}/{}.{}", prefix.trim_matches('/'), Uuid::new_v4(), extension)
    }

    /// Resolve a key below the root, refusing anything that escapes it
    fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if !safe {
            return Err(AppError::BadRequest(format!("Invalid storage key '{}'", key)));
        }

        Ok(self.root.join(relative))
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(
        &self,
        prefix: &str,
        original_filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredFile, AppError> {
        let key = Self::generate_key(prefix, original_filename, content_type);
        let target = self.resolve(&key)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Internal(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let size = data.len() as i64;
        tokio::fs::write(&target, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file '{}': {}", key, e)))?;

        debug!("Stored '{}' as {} ({} bytes)", original_filename, key, size);

        Ok(StoredFile {
            url: self.url_for(&key),
            path: key,
            mime_type: content_type.to_string(),
            size,
        })
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        let target = self.resolve(path)?;

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                debug!("Removed stored file {}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Stored file {} already gone", path);
                Ok(())
            }
            Err(e) => Err(AppError::Internal(format!(
                "Failed to remove file '{}': {}",
                path, e
            ))),
        }
    }
}

/// File extension for the accepted upload MIME types
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "application/pdf" => Some("pdf"),
        "application/msword" => Some("doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        "application/vnd.ms-excel" => Some("xls"),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some("xlsx"),
        "text/plain" => Some("txt"),
        "text/csv" => Some("csv"),
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> StorageConfig {
        StorageConfig {
            upload_dir: dir.to_path_buf(),
            public_base_url: "/uploads".to_string(),
            max_file_size: 1024,
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("qms-store-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_generate_key_prefers_content_type_extension() {
        let key = LocalFileStore::generate_key("audit/abc", "report.PDF", "application/pdf");
        assert!(key.starts_with("audit/abc/"));
        assert!(key.ends_with(".pdf"));
    }

    #[test]
    fn test_generate_key_falls_back_to_filename_then_bin() {
        let key = LocalFileStore::generate_key("x", "notes.MD", "text/markdown");
        assert!(key.ends_with(".md"));

        let key = LocalFileStore::generate_key("x", "noext", "application/octet-stream");
        assert!(key.ends_with(".bin"));
    }

    #[tokio::test]
    async fn test_save_and_remove_round_trip() {
        let dir = temp_dir();
        let store = LocalFileStore::new(&config(&dir)).await.unwrap();

        let stored = store
            .save("objective/1", "plan.txt", "text/plain", b"hello".to_vec())
            .await
            .unwrap();

        assert_eq!(stored.size, 5);
        assert_eq!(stored.mime_type, "text/plain");
        assert_eq!(stored.url, format!("/uploads/{}", stored.path));
        assert!(store.root().join(&stored.path).exists());

        store.remove(&stored.path).await.unwrap();
        assert!(!store.root().join(&stored.path).exists());

        // removing twice is fine
        tokio_test::assert_ok!(store.remove(&stored.path).await);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_remove_rejects_escaping_keys() {
        let dir = temp_dir();
        let store = LocalFileStore::new(&config(&dir)).await.unwrap();

        let error = tokio_test::assert_err!(store.remove("../etc/passwd").await);
        assert!(matches!(error, AppError::BadRequest(_)));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
