//! Authentication states, one variant per form mode.
//!
//! # Invariants
//! - Only OTP modes carry a pending email and a resend cooldown.
//! - Only `VerifyOtp` keeps the registration password, for the auto-login
//!   that follows a successful verification.

use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Seconds a user waits before another OTP can be requested.
pub const RESEND_COOLDOWN_SECONDS: u32 = 60;

/// Password held in memory between registration and OTP verification.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Outstanding OTP exchange for one email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub email: String,
    pub cooldown_seconds: u32,
}

impl OtpChallenge {
    /// Challenge right after a code was sent: cooldown at its maximum.
    pub fn fresh(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            cooldown_seconds: RESEND_COOLDOWN_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Login,
    Register,
    VerifyOtp {
        challenge: OtpChallenge,
        password: Password,
    },
    Forgot,
    ResetOtp {
        challenge: OtpChallenge,
    },
    /// Terminal: control has left the flow until logout.
    Authenticated {
        identity: String,
    },
}

impl AuthState {
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::Login => AuthMode::Login,
            Self::Register => AuthMode::Register,
            Self::VerifyOtp { .. } => AuthMode::VerifyOtp,
            Self::Forgot => AuthMode::Forgot,
            Self::ResetOtp { .. } => AuthMode::ResetOtp,
            Self::Authenticated { .. } => AuthMode::Authenticated,
        }
    }

    pub fn challenge(&self) -> Option<&OtpChallenge> {
        match self {
            Self::VerifyOtp { challenge, .. } | Self::ResetOtp { challenge } => Some(challenge),
            _ => None,
        }
    }

    pub(crate) fn challenge_mut(&mut self) -> Option<&mut OtpChallenge> {
        match self {
            Self::VerifyOtp { challenge, .. } | Self::ResetOtp { challenge } => Some(challenge),
            _ => None,
        }
    }

    /// Remaining resend cooldown; zero outside OTP modes.
    pub fn cooldown_seconds(&self) -> u32 {
        self.challenge()
            .map_or(0, |challenge| challenge.cooldown_seconds)
    }

    pub fn pending_email(&self) -> Option<&str> {
        self.challenge().map(|challenge| challenge.email.as_str())
    }
}

/// Payload-free view of [`AuthState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
    VerifyOtp,
    Forgot,
    ResetOtp,
    Authenticated,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::VerifyOtp => "verify_otp",
            Self::Forgot => "forgot",
            Self::ResetOtp => "reset_otp",
            Self::Authenticated => "authenticated",
        }
    }
}

impl Display for AuthMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modes a user can switch to directly. OTP modes are only reachable
/// through a successful register/forgot submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Login,
    Register,
    Forgot,
}

impl From<EntryMode> for AuthState {
    fn from(value: EntryMode) -> Self {
        match value {
            EntryMode::Login => Self::Login,
            EntryMode::Register => Self::Register,
            EntryMode::Forgot => Self::Forgot,
        }
    }
}

impl FromStr for EntryMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "login" => Ok(Self::Login),
            "register" | "signup" => Ok(Self::Register),
            "forgot" => Ok(Self::Forgot),
            other => Err(format!(
                "unsupported mode `{other}`; expected login|register|forgot"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthMode, AuthState, EntryMode, OtpChallenge, Password};

    #[test]
    fn password_debug_is_redacted() {
        let rendered = format!("{:?}", Password::new("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn only_otp_modes_report_cooldown() {
        let verify = AuthState::VerifyOtp {
            challenge: OtpChallenge::fresh("ana@x.com"),
            password: Password::new("pw1"),
        };
        assert_eq!(verify.cooldown_seconds(), 60);
        assert_eq!(verify.pending_email(), Some("ana@x.com"));
        assert_eq!(AuthState::Login.cooldown_seconds(), 0);
        assert_eq!(AuthState::from(EntryMode::Forgot).mode(), AuthMode::Forgot);
    }
}
