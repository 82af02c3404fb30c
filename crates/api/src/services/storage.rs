//! S3-compatible object storage for resumes and avatars.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use domain::models::StoredFile;
use domain::services::{FileStorage, FileUpload, StorageError};
use tracing::{error, info, warn};

use crate::config::StorageConfig;

pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    /// Builds the client. A custom endpoint (MinIO and similar) switches to
    /// path-style addressing.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if !config.access_key_id.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                &config.access_key_id,
                &config.secret_access_key,
                None,
                None,
                "applicant-tracking-static",
            ));
        }
        if !config.endpoint.is_empty() {
            loader = loader.endpoint_url(&config.endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(!config.endpoint.is_empty())
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_base_url: public_base_url(config),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

/// Public URL prefix for objects: the configured value, else derived from the
/// endpoint or the AWS virtual-hosted URL.
fn public_base_url(config: &StorageConfig) -> String {
    if !config.public_base_url.is_empty() {
        config.public_base_url.clone()
    } else if !config.endpoint.is_empty() {
        format!("{}/{}", config.endpoint.trim_end_matches('/'), config.bucket)
    } else {
        format!(
            "https://{}.s3.{}.amazonaws.com",
            config.bucket, config.region
        )
    }
}

#[async_trait::async_trait]
impl FileStorage for S3Storage {
    async fn upload(&self, key: &str, upload: FileUpload) -> Result<StoredFile, StorageError> {
        let size = upload.bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(upload.bytes))
            .content_type(&upload.content_type)
            .send()
            .await
            .map_err(|e| {
                error!(key = %key, error = %e, "S3 upload failed");
                StorageError::UploadFailed(e.to_string())
            })?;

        info!(
            key = %key,
            bytes = size,
            file_name = %upload.file_name,
            "Uploaded file to object storage"
        );

        Ok(StoredFile {
            public_id: key.to_string(),
            secure_url: self.object_url(key),
            uploaded_at: Utc::now(),
        })
    }
}

/// Used when `storage.enabled` is false: every upload is refused.
pub struct UnconfiguredStorage;

#[async_trait::async_trait]
impl FileStorage for UnconfiguredStorage {
    async fn upload(&self, key: &str, _upload: FileUpload) -> Result<StoredFile, StorageError> {
        warn!(key = %key, "Upload attempted but object storage is disabled");
        Err(StorageError::NotConfigured)
    }
}
