//! Durable client session: signed-in identity and display theme.
//!
//! # Responsibility
//! - Own the single persistence port for identity and theme.
//! - Tie the identity lifecycle to sign-in, rename and sign-out.
//!
//! # Invariants
//! - Writes hit the port first; the in-memory copy only changes after the
//!   port accepted the new value.
//! - `clear` drops the identity and keeps the theme.
//! - Callers read the identity at request time, never cache it.

use crate::db::DbError;
use log::info;
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemorySessionPort;
pub use sqlite::SqliteSessionPort;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub enum SessionError {
    Db(DbError),
    InvalidData(String),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid session data: {message}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SessionError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SessionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Display theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Everything the client keeps across restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSession {
    pub identity: Option<String>,
    pub theme: Theme,
}

/// Persistence port for [`PersistedSession`].
pub trait SessionPort {
    fn load(&self) -> SessionResult<PersistedSession>;
    fn save(&self, session: &PersistedSession) -> SessionResult<()>;
    /// Removes the stored identity. The theme survives.
    fn clear(&self) -> SessionResult<()>;
}

/// Process-wide session handle shared by the flow and the stores.
pub struct SessionStore {
    port: Box<dyn SessionPort>,
    current: RefCell<PersistedSession>,
}

impl SessionStore {
    /// Loads persisted state through `port`.
    pub fn open(port: impl SessionPort + 'static) -> SessionResult<Self> {
        let current = port.load()?;
        info!(
            "event=session_open module=session status=ok signed_in={} theme={}",
            current.identity.is_some(),
            current.theme.as_str()
        );
        Ok(Self {
            port: Box::new(port),
            current: RefCell::new(current),
        })
    }

    /// Session without durable backing.
    pub fn in_memory() -> Self {
        Self {
            port: Box::new(MemorySessionPort::default()),
            current: RefCell::new(PersistedSession::default()),
        }
    }

    pub fn identity(&self) -> Option<String> {
        self.current.borrow().identity.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.borrow().identity.is_some()
    }

    pub fn theme(&self) -> Theme {
        self.current.borrow().theme
    }

    /// Stores `identity` as the signed-in principal.
    pub fn sign_in(&self, identity: &str) -> SessionResult<()> {
        let identity = normalize_identity(identity)?;
        self.commit(|next| next.identity = Some(identity))?;
        info!("event=session_sign_in module=session status=ok");
        Ok(())
    }

    /// Replaces the identity after a username change. Ignored when signed out.
    pub fn rename(&self, identity: &str) -> SessionResult<()> {
        if !self.is_signed_in() {
            return Ok(());
        }
        let identity = normalize_identity(identity)?;
        self.commit(|next| next.identity = Some(identity))
    }

    pub fn sign_out(&self) -> SessionResult<()> {
        self.port.clear()?;
        self.current.borrow_mut().identity = None;
        info!("event=session_sign_out module=session status=ok");
        Ok(())
    }

    pub fn set_theme(&self, theme: Theme) -> SessionResult<()> {
        self.commit(|next| next.theme = theme)
    }

    /// Flips light/dark and returns the new theme.
    pub fn toggle_theme(&self) -> SessionResult<Theme> {
        let theme = self.theme().toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    fn commit(&self, change: impl FnOnce(&mut PersistedSession)) -> SessionResult<()> {
        let mut next = self.current.borrow().clone();
        change(&mut next);
        self.port.save(&next)?;
        *self.current.borrow_mut() = next;
        Ok(())
    }
}

fn normalize_identity(identity: &str) -> SessionResult<String> {
    let trimmed = identity.trim();
    if trimmed.is_empty() {
        return Err(SessionError::InvalidData(
            "identity cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
