//! Local HTTP front end (`serve` mode)
//!
//! Stands in for the API gateway: each HTTP request is turned into the same
//! event the gateway would deliver, handed to [`Gateway::handle`], and the
//! resulting response is written back verbatim.
//!
//! Routes:
//!   GET /health                               - liveness + build info
//!   ANY /common/:repository/:bucket/*proxy    - shared-bucket mode
//!   ANY /:bucket/*proxy                       - single-bucket mode

use crate::api::{Gateway, GatewayError, GatewayEvent, GatewayResponse, PathParameters};
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use base64::Engine;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, Instrument};

/// Resource template of single-bucket routes, as configured on the API gateway.
pub const SINGLE_BUCKET_RESOURCE: &str = "/{bucket}/{proxy+}";

/// Resource template of shared-bucket routes.
pub const SHARED_BUCKET_RESOURCE: &str = "/common/{repository}/{bucket}/{proxy+}";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub build_time: &'static str,
}

/// Build the router for `serve` mode.
pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/common/:repository/:bucket/*proxy",
            any(shared_bucket_request),
        )
        .route("/:bucket/*proxy", any(single_bucket_request))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        build_time: env!("LFSGW_BUILD_TIME"),
    })
}

async fn single_bucket_request(
    State(gateway): State<Arc<Gateway>>,
    Path((bucket, proxy)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = to_event(
        SINGLE_BUCKET_RESOURCE,
        PathParameters {
            proxy: Some(proxy),
            bucket: Some(bucket),
            repository: None,
        },
        &headers,
        &body,
    );
    dispatch(&gateway, event).await
}

async fn shared_bucket_request(
    State(gateway): State<Arc<Gateway>>,
    Path((repository, bucket, proxy)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = to_event(
        SHARED_BUCKET_RESOURCE,
        PathParameters {
            proxy: Some(proxy),
            bucket: Some(bucket),
            repository: Some(repository),
        },
        &headers,
        &body,
    );
    dispatch(&gateway, event).await
}

/// Translate an HTTP request into a gateway event.
///
/// Non-UTF-8 bodies are base64-wrapped with `isBase64Encoded`, as the gateway
/// does for binary media types.
pub fn to_event(
    resource: &str,
    mut path_parameters: PathParameters,
    headers: &HeaderMap,
    body: &Bytes,
) -> GatewayEvent {
    path_parameters.proxy = path_parameters
        .proxy
        .map(|p| p.trim_start_matches('/').to_string());

    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let (body, is_base64_encoded) = if body.is_empty() {
        (None, false)
    } else {
        match std::str::from_utf8(body) {
            Ok(text) => (Some(text.to_string()), false),
            Err(_) => (
                Some(base64::engine::general_purpose::STANDARD.encode(body)),
                true,
            ),
        }
    };

    GatewayEvent {
        resource: Some(resource.to_string()),
        path_parameters: Some(path_parameters),
        headers: Some(headers),
        body,
        is_base64_encoded: Some(is_base64_encoded),
    }
}

async fn dispatch(gateway: &Gateway, event: GatewayEvent) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("invocation", %request_id);
    match gateway.handle(&event).instrument(span).await {
        Ok(response) => into_http(response),
        Err(e) => {
            error!("Storage fault (request {}): {}", request_id, e);
            into_http(GatewayError::from(e).into_response())
        }
    }
}

/// Write a gateway response back as an HTTP response.
pub fn into_http(response: GatewayResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http = (status, Body::from(response.body)).into_response();
    for (name, value) in &response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            http.headers_mut().insert(name, value);
        }
    }
    http
}
