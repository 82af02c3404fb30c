//! Object storage port for applicant uploads.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use thiserror::Error;

use crate::models::StoredFile;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Storage not configured")]
    NotConfigured,
}

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait::async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `upload` under `key`, replacing any existing object.
    async fn upload(&self, key: &str, upload: FileUpload) -> Result<StoredFile, StorageError>;
}

/// Storage that keeps objects in memory.
#[derive(Debug)]
pub struct MockFileStorage {
    base_url: String,
    objects: Mutex<HashMap<String, FileUpload>>,
}

impl MockFileStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<FileUpload> {
        self.objects.lock().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl FileStorage for MockFileStorage {
    async fn upload(&self, key: &str, upload: FileUpload) -> Result<StoredFile, StorageError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| StorageError::UploadFailed("storage lock poisoned".to_string()))?;
        objects.insert(key.to_string(), upload);

        Ok(StoredFile {
            public_id: key.to_string(),
            secure_url: format!("{}/{}", self.base_url.trim_end_matches('/'), key),
            uploaded_at: Utc::now(),
        })
    }
}
