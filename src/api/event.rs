//! API Gateway proxy event and response shapes
//!
//! Only the fields the gateway reads are modelled; everything else in the
//! event (requestContext, multiValueHeaders, ...) is ignored. Every modelled
//! field tolerates being absent or `null` so that a sparse event becomes a
//! validation failure instead of a deserialization fault.

use axum::http::StatusCode;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Incoming gateway event
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEvent {
    /// Route template, e.g. `/{bucket}/{proxy+}`
    #[serde(default)]
    pub resource: Option<String>,

    #[serde(default)]
    pub path_parameters: Option<PathParameters>,

    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub is_base64_encoded: Option<bool>,
}

/// Path parameters captured by the route template
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PathParameters {
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl GatewayEvent {
    pub fn resource(&self) -> Option<&str> {
        non_empty(&self.resource)
    }

    pub fn proxy(&self) -> Option<&str> {
        self.path_parameters.as_ref().and_then(|p| non_empty(&p.proxy))
    }

    pub fn bucket(&self) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|p| non_empty(&p.bucket))
    }

    pub fn repository(&self) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|p| non_empty(&p.repository))
    }

    /// Look up a header by name, ignoring ASCII case.
    ///
    /// REST APIs forward header names as the client spelled them, HTTP APIs
    /// lowercase them. An exact match wins; otherwise the lexicographically
    /// smallest case-insensitive match is used, so the result does not depend
    /// on map iteration order.
    pub fn header(&self, name: &str) -> Option<&str> {
        let headers = self.headers.as_ref()?;
        if let Some(value) = headers.get(name) {
            return Some(value.as_str());
        }
        headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, v)| v.as_str())
    }

    /// Request body as text, undoing the gateway's base64 wrapping of binary
    /// payloads. `None` when the body is absent, empty, or not decodable.
    pub fn body_text(&self) -> Option<String> {
        let body = non_empty(&self.body)?;
        if self.is_base64_encoded.unwrap_or(false) {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(body.trim())
                .ok()?;
            String::from_utf8(bytes).ok().filter(|b| !b.is_empty())
        } else {
            Some(body.to_string())
        }
    }
}

/// Outgoing gateway response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl GatewayResponse {
    /// Response with a pre-rendered JSON body.
    pub fn new(status: StatusCode, headers: BTreeMap<String, String>, body: String) -> Self {
        Self {
            status_code: status.as_u16(),
            headers,
            body,
        }
    }

    /// `{"message": ...}` body with no headers; the shape of every error.
    pub fn message(status: StatusCode, message: &str) -> Self {
        Self::new(
            status,
            BTreeMap::new(),
            serde_json::json!({ "message": message }).to_string(),
        )
    }

    /// Decode the body as JSON.
    pub fn json_body(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}
