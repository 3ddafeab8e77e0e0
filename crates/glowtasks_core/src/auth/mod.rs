//! Authentication state machine.
//!
//! # Responsibility
//! - Drive login, registration, OTP verification and password reset.
//! - Own the resend cooldown and the single in-flight request slot.
//! - Write the signed-in identity to the session on success.
//!
//! # Invariants
//! - Local failures (validation, busy, cooldown, wrong mode) never reach the
//!   network.
//! - A failed submission leaves the state exactly as it was.

use crate::api::ApiError;
use crate::session::SessionError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod cooldown;
pub mod flow;
pub mod state;

pub use cooldown::{CooldownTick, CooldownTicks};
pub use flow::{AuthFlow, FlowMessages};
pub use state::{
    AuthMode, AuthState, EntryMode, OtpChallenge, Password, RESEND_COOLDOWN_SECONDS,
};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug)]
pub enum AuthError {
    /// A required field is missing or malformed.
    Validation(String),
    /// Another submission of this flow is still in flight.
    Busy,
    /// OTP resend requested before the cooldown elapsed.
    CooldownActive { remaining_seconds: u32 },
    /// The operation does not apply to the current mode.
    WrongMode {
        expected: &'static str,
        actual: AuthMode,
    },
    Api(ApiError),
    Session(SessionError),
}

impl AuthError {
    /// Text shown to the user; `fallback` covers server failures without one.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api(err) => err.user_message(fallback),
            Self::Validation(message) => message.clone(),
            Self::CooldownActive { remaining_seconds } => {
                format!("You can resend OTP in {remaining_seconds}s")
            }
            Self::Busy => "Please wait for the current request to finish".to_string(),
            Self::WrongMode { .. } | Self::Session(_) => fallback.to_string(),
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::Busy => f.write_str("another request is in flight"),
            Self::CooldownActive { remaining_seconds } => {
                write!(f, "resend cooldown active for {remaining_seconds}s")
            }
            Self::WrongMode { expected, actual } => {
                write!(f, "operation requires {expected} mode, current mode is {actual}")
            }
            Self::Api(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Api(err) => Some(err),
            Self::Session(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<SessionError> for AuthError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

/// Trimmed non-empty value, or a validation error naming `label`.
fn required<'a>(label: &str, value: &'a str) -> AuthResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::Validation(format!("{label} is required")));
    }
    Ok(trimmed)
}

/// Secrets are checked for presence but passed through untrimmed.
fn required_secret<'a>(label: &str, value: &'a str) -> AuthResult<&'a str> {
    required(label, value).map(|_| value)
}

fn required_email<'a>(value: &'a str) -> AuthResult<&'a str> {
    let email = required("Email", value)?;
    if !EMAIL_RE.is_match(email) {
        return Err(AuthError::Validation(format!(
            "`{email}` is not a valid email address"
        )));
    }
    Ok(email)
}
