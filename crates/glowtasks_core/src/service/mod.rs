//! Server-backed caches for the signed-in user.
//!
//! # Responsibility
//! - Mirror the active tasks, the trash and the profile for presentation.
//! - Apply mutations only after the server confirmed them (confirm-then-apply),
//!   using the entity the server returned.
//!
//! # Invariants
//! - A failed operation leaves the cache untouched and records a message.
//! - No operation is retried or cancelled automatically.
//! - Cache borrows are never held across an `.await`.

use crate::api::ApiError;
use crate::session::SessionError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod profile_service;
pub mod task_store;
pub mod trash_store;

pub use profile_service::ProfileService;
pub use task_store::TaskStore;
pub use trash_store::TrashStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Input rejected before any request was made.
    Validation(String),
    Api(ApiError),
    Session(SessionError),
}

impl StoreError {
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Api(err) => err.user_message(fallback),
            Self::Session(_) => fallback.to_string(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::Api(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(_) => None,
            Self::Api(err) => Some(err),
            Self::Session(err) => Some(err),
        }
    }
}

impl From<ApiError> for StoreError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<SessionError> for StoreError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}
