//! Gateway seam and the response contract shared by every transport.

use super::{ApiError, ApiResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute path below the service root, e.g. `/api/tasks`.
    pub path: String,
    pub body: Option<Value>,
    /// Plain identifier sent as the identity header. See [`super::IDENTITY_HEADER`].
    pub identity: Option<String>,
    /// Correlation id for logs only; never sent to the server.
    pub request_id: Uuid,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            identity: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }
}

/// Transport that performs one JSON exchange.
///
/// The core runs on a single cooperative thread, so implementations are not
/// required to be `Send`.
#[async_trait(?Send)]
pub trait ApiGateway {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value>;
}

/// Maps a raw status + body to the parsed result.
///
/// - success, empty or non-JSON body -> `{}`
/// - success, JSON body -> the parsed value
/// - failure, JSON body -> [`ApiError::Request`] with its `message` field
/// - failure, empty body -> [`ApiError::Request`] without message
/// - failure, non-JSON body -> [`ApiError::InvalidResponse`]
pub fn interpret_response(status: u16, body: &str) -> ApiResult<Value> {
    let success = (200..300).contains(&status);
    let parsed = if body.trim().is_empty() {
        Ok(Value::Object(Map::new()))
    } else {
        serde_json::from_str::<Value>(body)
    };

    match (success, parsed) {
        (true, Ok(value)) => Ok(value),
        (true, Err(_)) => Ok(Value::Object(Map::new())),
        (false, Ok(value)) => Err(ApiError::Request {
            status,
            message: value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        }),
        (false, Err(_)) => Err(ApiError::InvalidResponse),
    }
}
