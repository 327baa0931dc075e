//! `objects/batch`: authenticate, validate the batch body, presign one URL per object.

use super::{GatewayError, GatewayEvent, GatewayResponse};
use crate::api::auth::authorize;
use crate::storage::{PresignMethod, PresignRequest, StorageBackend};
use crate::types::{
    Action, BatchRequest, BatchResponse, ObjectResponse, Operation, LFS_JSON_CONTENT_TYPE,
};
use axum::http::StatusCode;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{error, info, warn};

/// Lifetime of every presigned URL
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Content type uploads are signed for
pub const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Storage key of an object: the oid, under the repository prefix in shared-bucket mode.
fn object_key(repository: Option<&str>, oid: &str) -> String {
    match repository {
        Some(repo) => format!("{}/{}", repo, oid),
        None => oid.to_string(),
    }
}

fn presign_request(operation: Operation, bucket: &str, key: String) -> PresignRequest {
    match operation {
        Operation::Download => PresignRequest {
            method: PresignMethod::Get,
            bucket: bucket.to_string(),
            key,
            expires_in: PRESIGNED_URL_TTL,
            content_type: None,
        },
        Operation::Upload => PresignRequest {
            method: PresignMethod::Put,
            bucket: bucket.to_string(),
            key,
            expires_in: PRESIGNED_URL_TTL,
            content_type: Some(UPLOAD_CONTENT_TYPE.to_string()),
        },
    }
}

pub(super) async fn batch_objects(
    backend: &dyn StorageBackend,
    event: &GatewayEvent,
    bucket: &str,
    repository: Option<&str>,
) -> Result<GatewayResponse, GatewayError> {
    if let Err(e) = authorize(backend, bucket, repository, event.header("Authorization")).await {
        if !matches!(e, GatewayError::Storage(_)) {
            warn!("Authorization failure");
        }
        return Err(e);
    }

    let body = event.body_text().ok_or_else(|| {
        warn!("Body parameter is empty");
        GatewayError::BadRequest("empty body".to_string())
    })?;
    let request = BatchRequest::from_body(&body).map_err(|e| {
        warn!("Invalid batch body: {}", e);
        GatewayError::BadRequest(e.to_string())
    })?;
    let operation = Operation::parse(&request.operation).ok_or_else(|| {
        warn!("Unsupported operation {:?}", request.operation);
        GatewayError::BadRequest(format!("unsupported operation {}", request.operation))
    })?;

    let count = request.objects.len();
    let mut objects = Vec::with_capacity(count);
    for object in request.objects {
        let key = object_key(repository, object.oid());
        let href = backend
            .presign(&presign_request(operation, bucket, key))
            .await?;
        if href.is_empty() {
            error!("Storage returned an empty {} URL for {}", operation, object.oid());
            return Err(GatewayError::InternalError(format!(
                "no presigned URL for {}",
                object.oid()
            )));
        }
        let granted = ObjectResponse::authenticated(
            object,
            operation,
            Action {
                href,
                expires_in: PRESIGNED_URL_TTL.as_secs(),
            },
        )
        .map_err(|e| GatewayError::InternalError(e.to_string()))?;
        objects.push(granted);
    }

    info!(
        "Issued {} {} URL(s) for bucket {} repository {:?}",
        count, operation, bucket, repository
    );

    let body = serde_json::to_string(&BatchResponse::basic(objects))
        .map_err(|e| GatewayError::InternalError(e.to_string()))?;
    let mut headers = BTreeMap::new();
    headers.insert(
        "Content-Type".to_string(),
        LFS_JSON_CONTENT_TYPE.to_string(),
    );
    Ok(GatewayResponse::new(StatusCode::OK, headers, body))
}
