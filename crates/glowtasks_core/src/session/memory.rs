//! Volatile session port.

use super::{PersistedSession, SessionPort, SessionResult};
use std::cell::RefCell;

/// Keeps session state in memory only; lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionPort {
    state: RefCell<PersistedSession>,
}

impl MemorySessionPort {
    /// Port pre-seeded as if a previous run had signed `identity` in.
    pub fn with_identity(identity: impl Into<String>) -> Self {
        Self {
            state: RefCell::new(PersistedSession {
                identity: Some(identity.into()),
                ..PersistedSession::default()
            }),
        }
    }
}

impl SessionPort for MemorySessionPort {
    fn load(&self) -> SessionResult<PersistedSession> {
        Ok(self.state.borrow().clone())
    }

    fn save(&self, session: &PersistedSession) -> SessionResult<()> {
        *self.state.borrow_mut() = session.clone();
        Ok(())
    }

    fn clear(&self) -> SessionResult<()> {
        self.state.borrow_mut().identity = None;
        Ok(())
    }
}
