//! S3 storage backend implementation using AWS SDK
//!
//! Reads bucket tags (where the LFS credentials live) and presigns
//! GetObject/PutObject requests. No object data ever passes through here.

use super::traits::{BucketTag, PresignMethod, PresignRequest, StorageBackend, StorageError};
use crate::config::BackendConfig;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::BehaviorVersion;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use tracing::{debug, instrument};

/// S3 storage backend
pub struct S3Backend {
    client: Client,
}

impl S3Backend {
    /// Build an S3 client from a BackendConfig without creating an S3Backend.
    pub fn build_client(config: &BackendConfig) -> Result<Client, StorageError> {
        // Require explicit credentials, never fall back to the default AWS credential chain
        // (~/.aws/credentials, instance metadata, etc.). `Config::load` already merged the
        // AWS_* variables the Lambda runtime provides.
        let credentials = match (&config.access_key_id, &config.secret_access_key) {
            (Some(key_id), Some(secret)) => Credentials::new(
                key_id,
                secret,
                config.session_token.clone(),
                None,
                "lfs_s3_gateway-config",
            ),
            _ => {
                return Err(StorageError::Other(
                    "S3 backend requires credentials: set LFSGW_AWS_ACCESS_KEY_ID and LFSGW_AWS_SECRET_ACCESS_KEY (or AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY)".to_string(),
                ));
            }
        };

        // Build S3 client directly from static credentials
        let mut s3_config_builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(config.force_path_style);

        if let Some(ref ep) = config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(ep);
        }

        Ok(Client::from_conf(s3_config_builder.build()))
    }

    /// Create a new S3 backend from configuration
    pub fn new(config: &BackendConfig) -> Result<Self, StorageError> {
        let client = Self::build_client(config)?;
        debug!("S3Backend initialized (region {})", config.region);
        Ok(Self { client })
    }

    /// Classify an S3 SDK error, keeping the missing-bucket and missing-tag-set
    /// cases apart from everything else.
    fn classify_s3_error(
        bucket: &str,
        e: &SdkError<impl std::fmt::Debug>,
        context: &str,
    ) -> StorageError {
        let debug_str = format!("{:?}", e);
        if debug_str.contains("NoSuchBucket") {
            return StorageError::BucketNotFound(bucket.to_string());
        }
        if debug_str.contains("NoSuchTagSet") {
            return StorageError::NoTagSet(bucket.to_string());
        }
        StorageError::S3(format!("{} failed: {}", context, e))
    }

    fn presign_error(request: &PresignRequest, e: impl std::fmt::Display) -> StorageError {
        StorageError::Presign(format!(
            "{:?} s3://{}/{}: {}",
            request.method, request.bucket, request.key, e
        ))
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    #[instrument(skip(self))]
    async fn bucket_tags(&self, bucket: &str) -> Result<Vec<BucketTag>, StorageError> {
        let output = self
            .client
            .get_bucket_tagging()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| Self::classify_s3_error(bucket, &e, "GetBucketTagging"))?;

        let tags: Vec<BucketTag> = output
            .tag_set()
            .iter()
            .map(|tag| BucketTag::new(tag.key(), tag.value()))
            .collect();
        debug!("Fetched {} tags", tags.len());
        Ok(tags)
    }

    #[instrument(skip(self, request), fields(bucket = %request.bucket, key = %request.key, method = ?request.method))]
    async fn presign(&self, request: &PresignRequest) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(request.expires_in)
            .map_err(|e| Self::presign_error(request, e))?;

        let presigned = match request.method {
            PresignMethod::Get => self
                .client
                .get_object()
                .bucket(&request.bucket)
                .key(&request.key)
                .presigned(presigning)
                .await
                .map_err(|e| Self::presign_error(request, e))?,
            PresignMethod::Put => {
                let mut builder = self
                    .client
                    .put_object()
                    .bucket(&request.bucket)
                    .key(&request.key);
                if let Some(ref content_type) = request.content_type {
                    builder = builder.content_type(content_type);
                }
                builder
                    .presigned(presigning)
                    .await
                    .map_err(|e| Self::presign_error(request, e))?
            }
        };

        debug!("Presigned URL issued");
        Ok(presigned.uri().to_string())
    }
}
