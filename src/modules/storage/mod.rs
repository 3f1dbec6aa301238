//! Storage module for uploaded documents
//!
//! `FileStore` is the seam between document handling and where bytes live.
//! The default implementation writes to a local directory that is served
//! read-only by the HTTP layer.

mod local_store;

pub use local_store::LocalFileStore;

use async_trait::async_trait;

use crate::core::error::AppError;

/// Where a saved file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Storage key, relative to the store root
    pub path: String,
    /// URL the file can be downloaded from
    pub url: String,
    pub mime_type: String,
    pub size: i64,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist `data` under a fresh key below `prefix`
    async fn save(
        &self,
        prefix: &str,
        original_filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredFile, AppError>;

    /// Remove a previously saved file; a missing file is not an error
    async fn remove(&self, path: &str) -> Result<(), AppError>;
}
