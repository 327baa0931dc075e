//! HTTP Basic authentication against bucket tags
//!
//! Each bucket carries its LFS credentials as plaintext tags:
//! `LFS_USERNAME` / `LFS_PASSWORD` for a single-repository bucket, or
//! `LFS_USERNAME-<repository>` / `LFS_PASSWORD-<repository>` for each
//! repository sharing a bucket.
//!
//! The decoded `user:password` string must equal the tag values joined by a
//! colon. There is no hashing; changing that needs a new tag format and a
//! migration of every bucket. The comparison runs in constant time but that
//! does not change its outcome.

use super::errors::GatewayError;
use crate::storage::{BucketTag, StorageBackend};
use base64::Engine;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

pub const USERNAME_TAG: &str = "LFS_USERNAME";
pub const PASSWORD_TAG: &str = "LFS_PASSWORD";

const BASIC_PREFIX: &str = "Basic ";

/// Tag names holding the credentials for one repository scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialTags {
    pub username: String,
    pub password: String,
}

impl CredentialTags {
    pub fn for_repository(repository: Option<&str>) -> Self {
        match repository {
            Some(repo) => Self {
                username: format!("{}-{}", USERNAME_TAG, repo),
                password: format!("{}-{}", PASSWORD_TAG, repo),
            },
            None => Self {
                username: USERNAME_TAG.to_string(),
                password: PASSWORD_TAG.to_string(),
            },
        }
    }

    /// The `user:password` string these tags describe, if both are present.
    /// First match wins when a key repeats.
    fn expected(&self, tags: &[BucketTag]) -> Option<String> {
        let find = |key: &str| tags.iter().find(|t| t.key == key).map(|t| t.value.as_str());
        let username = find(&self.username)?;
        let password = find(&self.password)?;
        Some(format!("{}:{}", username, password))
    }
}

/// Decode a `Basic <base64>` Authorization value into its `user:password` text.
///
/// The `Basic ` prefix is optional and whitespace around the payload is
/// ignored; a bare base64 value is accepted the same way. Returns `None`
/// unless the payload is valid base64 of pure ASCII.
pub fn decode_basic(header: &str) -> Option<String> {
    let encoded = header.strip_prefix(BASIC_PREFIX).unwrap_or(header).trim();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    if !bytes.is_ascii() {
        return None;
    }
    String::from_utf8(bytes).ok()
}

/// Check the caller's Basic credentials against the bucket's tags.
///
/// Header problems are rejected before the tag set is fetched. Storage faults
/// surface as `GatewayError::Storage`.
pub async fn authorize(
    backend: &dyn StorageBackend,
    bucket: &str,
    repository: Option<&str>,
    authorization: Option<&str>,
) -> Result<(), GatewayError> {
    let header = authorization
        .filter(|h| !h.is_empty())
        .ok_or_else(|| {
            warn!("\"Authorization\" header is empty");
            GatewayError::Forbidden("missing Authorization header".to_string())
        })?;

    let supplied = decode_basic(header).ok_or_else(|| {
        warn!("Authorization header is not valid Basic credentials");
        GatewayError::Forbidden("undecodable Authorization header".to_string())
    })?;

    let tags = backend.bucket_tags(bucket).await?;
    if tags.len() < 2 {
        warn!("No tags on bucket {}", bucket);
        return Err(GatewayError::Forbidden(format!(
            "bucket {} has fewer than two tags",
            bucket
        )));
    }

    let scope = CredentialTags::for_repository(repository);
    let expected = scope.expected(&tags).ok_or_else(|| {
        warn!(
            "No auth data on bucket {} (expected tags {} and {})",
            bucket, scope.username, scope.password
        );
        GatewayError::Forbidden(format!("no credential tags on bucket {}", bucket))
    })?;

    if bool::from(expected.as_bytes().ct_eq(supplied.as_bytes())) {
        debug!("Credentials accepted for bucket {}", bucket);
        Ok(())
    } else {
        warn!("Credential mismatch for bucket {}", bucket);
        Err(GatewayError::Forbidden("credential mismatch".to_string()))
    }
}
