//! SQLite-backed session port.
//!
//! # Invariants
//! - Identity and theme live in the `preferences` table under fixed keys.
//! - An unknown persisted theme falls back to the default and is logged.

use super::{PersistedSession, SessionPort, SessionResult, Theme};
use crate::db::{open_db, open_db_in_memory};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const IDENTITY_KEY: &str = "session.identity";
const THEME_KEY: &str = "ui.theme";

pub struct SqliteSessionPort {
    conn: Connection,
}

impl SqliteSessionPort {
    /// Opens the state database at `path`, creating it when missing.
    pub fn open(path: impl AsRef<Path>) -> SessionResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn in_memory() -> SessionResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn read(&self, key: &str) -> SessionResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(conn: &Connection, key: &str, value: &str) -> SessionResult<()> {
        conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SessionPort for SqliteSessionPort {
    fn load(&self) -> SessionResult<PersistedSession> {
        let identity = self
            .read(IDENTITY_KEY)?
            .filter(|value| !value.trim().is_empty());
        let theme = match self.read(THEME_KEY)? {
            Some(value) => Theme::parse(&value).unwrap_or_else(|| {
                warn!("event=session_load module=session status=degraded reason=unknown_theme value={value}");
                Theme::default()
            }),
            None => Theme::default(),
        };
        Ok(PersistedSession { identity, theme })
    }

    fn save(&self, session: &PersistedSession) -> SessionResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        match session.identity.as_deref() {
            Some(identity) => Self::write(&tx, IDENTITY_KEY, identity)?,
            None => {
                tx.execute("DELETE FROM preferences WHERE key = ?1;", [IDENTITY_KEY])?;
            }
        }
        Self::write(&tx, THEME_KEY, session.theme.as_str())?;
        tx.commit()?;
        Ok(())
    }

    fn clear(&self) -> SessionResult<()> {
        self.conn
            .execute("DELETE FROM preferences WHERE key = ?1;", [IDENTITY_KEY])?;
        Ok(())
    }
}
