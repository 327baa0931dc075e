//! Git LFS batch API wire types
//!
//! Request and response bodies of the batch endpoint, restricted to the
//! `basic` transfer adapter:
//! <https://github.com/git-lfs/git-lfs/blob/main/docs/api/batch.md>

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Content type of every successful batch response.
pub const LFS_JSON_CONTENT_TYPE: &str = "application/vnd.git-lfs+json; charset=utf-8";

/// Batch operation requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Download,
    Upload,
}

impl Operation {
    /// Parse the `operation` field of a batch request. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "download" => Some(Operation::Download),
            "upload" => Some(Operation::Upload),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Download => "download",
            Operation::Upload => "upload",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transfer adapter named in the response. Only `basic` is ever offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transfer {
    Basic,
}

/// One object descriptor from the request.
///
/// Only `oid` is interpreted. The descriptor is kept whole, in the client's
/// field order, so it can be echoed back with the granted action appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ObjectSpec {
    #[serde(skip)]
    oid: String,
    fields: Map<String, Value>,
}

impl ObjectSpec {
    /// Accept a JSON object carrying a string `oid`.
    pub fn from_value(value: Value) -> Result<Self, BatchParseError> {
        let Value::Object(fields) = value else {
            return Err(BatchParseError::Malformed(
                "object descriptor is not a JSON object".to_string(),
            ));
        };
        let oid = match fields.get("oid") {
            Some(Value::String(oid)) => oid.clone(),
            _ => {
                return Err(BatchParseError::Malformed(
                    "object descriptor has no string oid".to_string(),
                ))
            }
        };
        Ok(Self { oid, fields })
    }

    pub fn oid(&self) -> &str {
        &self.oid
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Errors produced while validating a batch request body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchParseError {
    #[error("body is not a valid batch request: {0}")]
    Malformed(String),

    #[error("operation is missing or empty")]
    MissingOperation,

    #[error("objects is missing or empty")]
    MissingObjects,
}

#[derive(Deserialize)]
struct RawBatchRequest {
    #[serde(default)]
    operation: Option<String>,
    #[serde(default)]
    objects: Option<Vec<Value>>,
}

/// A batch request whose `operation` and `objects` are known to be non-empty.
///
/// `operation` stays a raw string here: an unsupported verb is a dispatch
/// decision, not a parse failure.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub operation: String,
    pub objects: Vec<ObjectSpec>,
}

impl BatchRequest {
    /// Parse a raw request body and check the fields the gateway relies on.
    ///
    /// The body must be a JSON object; serde would otherwise also accept a
    /// sequence laid out in field order.
    pub fn from_body(body: &str) -> Result<Self, BatchParseError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| BatchParseError::Malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(BatchParseError::Malformed(
                "body is not a JSON object".to_string(),
            ));
        }
        let raw: RawBatchRequest =
            serde_json::from_value(value).map_err(|e| BatchParseError::Malformed(e.to_string()))?;

        let operation = raw
            .operation
            .filter(|op| !op.is_empty())
            .ok_or(BatchParseError::MissingOperation)?;
        let objects = raw
            .objects
            .filter(|objects| !objects.is_empty())
            .ok_or(BatchParseError::MissingObjects)?
            .into_iter()
            .map(ObjectSpec::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { operation, objects })
    }
}

/// Signed action handed to the client for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub href: String,
    pub expires_in: u64,
}

/// Actions map of a response object. Exactly one entry is set, keyed by operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Actions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<Action>,
}

impl Actions {
    pub fn for_operation(operation: Operation, action: Action) -> Self {
        match operation {
            Operation::Download => Actions {
                download: Some(action),
                ..Default::default()
            },
            Operation::Upload => Actions {
                upload: Some(action),
                ..Default::default()
            },
        }
    }
}

/// Request descriptor augmented with the granted action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ObjectResponse(Map<String, Value>);

impl ObjectResponse {
    /// Append `authenticated` and `actions` to the descriptor. A client-sent
    /// copy of either key is overwritten where it stands.
    pub fn authenticated(
        object: ObjectSpec,
        operation: Operation,
        action: Action,
    ) -> Result<Self, serde_json::Error> {
        let mut fields = object.fields;
        fields.insert("authenticated".to_string(), Value::Bool(true));
        fields.insert(
            "actions".to_string(),
            serde_json::to_value(Actions::for_operation(operation, action))?,
        );
        Ok(Self(fields))
    }
}

/// Successful batch response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResponse {
    pub transfer: Transfer,
    pub objects: Vec<ObjectResponse>,
}

impl BatchResponse {
    pub fn basic(objects: Vec<ObjectResponse>) -> Self {
        Self {
            transfer: Transfer::Basic,
            objects,
        }
    }
}
