//! Gateway request handlers
//!
//! Split into submodules by route:
//! - `batch`: `objects/batch`, the LFS batch API
//! - `locks`: `locks/verify`, answered with a fixed 404

mod batch;
mod locks;

use super::errors::GatewayError;
use super::event::{GatewayEvent, GatewayResponse};
use crate::storage::{StorageBackend, StorageError};
use std::sync::Arc;
use tracing::{debug, warn};

pub use batch::{PRESIGNED_URL_TTL, UPLOAD_CONTENT_TYPE};

/// Second segment of a shared-bucket resource template (`/common/{repository}/...`).
pub const SHARED_BUCKET_SEGMENT: &str = "common";

/// `proxy` suffix of the lock verification endpoint
pub const LOCKS_VERIFY: &str = "locks/verify";

/// `proxy` suffix of the batch endpoint
pub const OBJECTS_BATCH: &str = "objects/batch";

/// The request handler. Holds the storage client for the life of the process.
#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn StorageBackend>,
}

impl Gateway {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Handle one gateway event.
    ///
    /// Every client-visible outcome, errors included, is an `Ok` response.
    /// `Err` is reserved for storage faults, which the host reports as an
    /// invocation failure.
    pub async fn handle(&self, event: &GatewayEvent) -> Result<GatewayResponse, StorageError> {
        match self.route(event).await {
            Ok(response) => Ok(response),
            Err(GatewayError::Storage(e)) => Err(e),
            Err(e) => {
                debug!("Request rejected: {}", e);
                Ok(e.into_response())
            }
        }
    }

    async fn route(&self, event: &GatewayEvent) -> Result<GatewayResponse, GatewayError> {
        let (Some(resource), Some(proxy), Some(bucket)) =
            (event.resource(), event.proxy(), event.bucket())
        else {
            warn!("pathParameters is empty");
            return Err(GatewayError::BadRequest(
                "resource, proxy and bucket are required".to_string(),
            ));
        };

        let repository = if is_shared_bucket(resource) {
            let repository = event.repository().ok_or_else(|| {
                warn!("Repository parameter is empty");
                GatewayError::BadRequest("shared bucket route without repository".to_string())
            })?;
            Some(repository)
        } else {
            None
        };

        debug!(
            "Routing proxy={} bucket={} repository={:?}",
            proxy, bucket, repository
        );

        match proxy {
            LOCKS_VERIFY => locks::verify_locks(event),
            OBJECTS_BATCH => batch::batch_objects(&*self.backend, event, bucket, repository).await,
            other => Err(GatewayError::NotFound(format!("no route for {}", other))),
        }
    }
}

/// True when the resource template's second `/`-separated segment is `common`.
fn is_shared_bucket(resource: &str) -> bool {
    resource.splitn(3, '/').nth(1) == Some(SHARED_BUCKET_SEGMENT)
}
