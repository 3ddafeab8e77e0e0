//! Remote service boundary.
//!
//! # Responsibility
//! - Define the gateway seam ([`ApiGateway`]) the core talks through.
//! - Interpret raw HTTP outcomes into parsed JSON or structured failures.
//! - Offer typed endpoint calls ([`ApiClient`]) to the flow and the stores.
//!
//! # Invariants
//! - A failed exchange never yields partial data.
//! - Identity-bearing endpoints fail locally, without a request, when no
//!   identity is signed in.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod client;
pub mod gateway;
pub mod http;

pub use client::{ApiClient, LoginResponse};
pub use gateway::{interpret_response, ApiGateway, ApiRequest, Method};
pub use http::{HttpGateway, IDENTITY_HEADER};

/// Message surfaced when a failing response is not JSON.
pub const INVALID_RESPONSE_MESSAGE: &str = "Server returned an invalid response";

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of one request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Non-success status. `message` is the body's `message` field, if any.
    Request { status: u16, message: Option<String> },
    /// Non-success status with a body that is not JSON.
    InvalidResponse,
    /// The server could not be reached or the body could not be read.
    Transport(String),
    /// A success body did not have the expected shape.
    Decode(String),
    /// The endpoint needs a signed-in identity and there is none.
    MissingIdentity,
}

impl ApiError {
    /// Human-readable text for the user; `fallback` covers failures that
    /// carry no server message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Request {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::InvalidResponse => INVALID_RESPONSE_MESSAGE.to_string(),
            Self::MissingIdentity => "You are not signed in".to_string(),
            _ => fallback.to_string(),
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request {
                status,
                message: Some(message),
            } => write!(f, "request failed with status {status}: {message}"),
            Self::Request {
                status,
                message: None,
            } => write!(f, "request failed with status {status}"),
            Self::InvalidResponse => f.write_str(INVALID_RESPONSE_MESSAGE),
            Self::Transport(reason) => write!(f, "transport failure: {reason}"),
            Self::Decode(reason) => write!(f, "unexpected response shape: {reason}"),
            Self::MissingIdentity => f.write_str("no signed-in identity"),
        }
    }
}

impl Error for ApiError {}
