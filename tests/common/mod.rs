//! Shared test infrastructure for integration tests
//!
//! Provides an in-memory `MockBackend` that serves a fixed tag set per bucket
//! and records every presign call, plus builders for gateway events.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use lfs_s3_gateway::api::{Gateway, GatewayEvent, PathParameters};
use lfs_s3_gateway::storage::{BucketTag, PresignMethod, PresignRequest, StorageBackend, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BUCKET: &str = "b1";
pub const SINGLE_RESOURCE: &str = "/{bucket}/{proxy+}";
pub const SHARED_RESOURCE: &str = "/common/{repository}/{bucket}/{proxy+}";

/// In-memory stand-in for S3.
#[derive(Default)]
pub struct MockBackend {
    tags: HashMap<String, Vec<BucketTag>>,
    /// When set, every presign call returns this string instead of a URL.
    forced_url: Option<String>,
    pub tag_reads: Mutex<Vec<String>>,
    pub presigned: Mutex<Vec<PresignRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, bucket: &str, tags: &[(&str, &str)]) -> Self {
        self.tags.insert(
            bucket.to_string(),
            tags.iter().map(|(k, v)| BucketTag::new(*k, *v)).collect(),
        );
        self
    }

    pub fn with_forced_url(mut self, url: &str) -> Self {
        self.forced_url = Some(url.to_string());
        self
    }

    pub fn presign_calls(&self) -> Vec<PresignRequest> {
        self.presigned.lock().unwrap().clone()
    }

    pub fn tag_read_count(&self) -> usize {
        self.tag_reads.lock().unwrap().len()
    }
}

/// Deterministic fake URL so tests can assert on it.
pub fn fake_url(method: PresignMethod, bucket: &str, key: &str) -> String {
    let verb = match method {
        PresignMethod::Get => "get",
        PresignMethod::Put => "put",
    };
    format!("https://{}.s3.example.com/{}?sig={}", bucket, key, verb)
}

#[async_trait]
impl StorageBackend for MockBackend {
    async fn bucket_tags(&self, bucket: &str) -> Result<Vec<BucketTag>, StorageError> {
        self.tag_reads.lock().unwrap().push(bucket.to_string());
        self.tags
            .get(bucket)
            .cloned()
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))
    }

    async fn presign(&self, request: &PresignRequest) -> Result<String, StorageError> {
        self.presigned.lock().unwrap().push(request.clone());
        Ok(self
            .forced_url
            .clone()
            .unwrap_or_else(|| fake_url(request.method, &request.bucket, &request.key)))
    }
}

/// Gateway over a shared mock, keeping a handle for call inspection.
pub fn gateway(backend: MockBackend) -> (Gateway, Arc<MockBackend>) {
    let backend = Arc::new(backend);
    (Gateway::new(backend.clone()), backend)
}

/// Standard single-bucket backend with credentials `u:p`.
pub fn single_bucket_backend() -> MockBackend {
    MockBackend::new().with_tags(BUCKET, &[("LFS_USERNAME", "u"), ("LFS_PASSWORD", "p")])
}

pub fn basic_auth(user: &str, password: &str) -> String {
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", user, password))
    )
}

pub fn batch_event(
    resource: &str,
    bucket: &str,
    repository: Option<&str>,
    authorization: Option<&str>,
    body: Option<&str>,
) -> GatewayEvent {
    let headers = authorization
        .map(|a| HashMap::from([("Authorization".to_string(), a.to_string())]));
    GatewayEvent {
        resource: Some(resource.to_string()),
        path_parameters: Some(PathParameters {
            proxy: Some("objects/batch".to_string()),
            bucket: Some(bucket.to_string()),
            repository: repository.map(|r| r.to_string()),
        }),
        headers,
        body: body.map(|b| b.to_string()),
        is_base64_encoded: None,
    }
}

/// Single-bucket batch event for `b1` with the given credentials and body.
pub fn single_batch(authorization: &str, body: &str) -> GatewayEvent {
    batch_event(SINGLE_RESOURCE, BUCKET, None, Some(authorization), Some(body))
}
