//! Storage backend trait definitions

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Bucket has no tag set: {0}")]
    NoTagSet(String),

    #[error("Presigning failed: {0}")]
    Presign(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Storage error: {0}")]
    Other(String),
}

/// One key/value tag attached to a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketTag {
    pub key: String,
    pub value: String,
}

impl BucketTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// HTTP method a presigned URL is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignMethod {
    Get,
    Put,
}

/// Everything needed to sign one object URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    pub method: PresignMethod,
    pub bucket: String,
    pub key: String,
    pub expires_in: Duration,
    /// Content type the uploader must send; only meaningful for PUT.
    pub content_type: Option<String>,
}

/// Object storage operations the gateway needs.
///
/// This trait is object-safe and can be used with `Arc<dyn StorageBackend>`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch the bucket's tag set, in the order the provider returns it.
    async fn bucket_tags(&self, bucket: &str) -> Result<Vec<BucketTag>, StorageError>;

    /// Produce a presigned URL. An empty string means the provider gave no URL.
    async fn presign(&self, request: &PresignRequest) -> Result<String, StorageError>;
}
