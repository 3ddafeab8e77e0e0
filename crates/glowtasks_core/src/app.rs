//! Wiring of one client instance.
//!
//! # Responsibility
//! - Build the shared session, API handle, auth flow and stores once.
//! - Hand the host the cooldown tick receiver it must drive.
//!
//! # Invariants
//! - Every component shares the same [`SessionStore`], so a sign-in or
//!   rename is visible to the next request from any of them.
//! - Logging out leaves no per-user cache behind for the next sign-in.

use crate::api::{ApiClient, ApiError, ApiGateway, HttpGateway};
use crate::auth::{AuthFlow, AuthResult, CooldownTicks};
use crate::config::ClientConfig;
use crate::service::{ProfileService, TaskStore, TrashStore};
use crate::session::{SessionError, SessionStore, SqliteSessionPort};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

#[derive(Debug)]
pub enum StartupError {
    Session(SessionError),
    Api(ApiError),
    DataDir(String),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(err) => write!(f, "cannot open session state: {err}"),
            Self::Api(err) => write!(f, "cannot build service gateway: {err}"),
            Self::DataDir(reason) => write!(f, "cannot prepare data directory: {reason}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Session(err) => Some(err),
            Self::Api(err) => Some(err),
            Self::DataDir(_) => None,
        }
    }
}

impl From<SessionError> for StartupError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<ApiError> for StartupError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

/// All client components over one session.
pub struct ClientContext {
    pub session: Rc<SessionStore>,
    pub api: ApiClient,
    pub auth: AuthFlow,
    pub tasks: TaskStore,
    pub trash: TrashStore,
    pub profile: ProfileService,
}

impl ClientContext {
    /// Opens the on-disk session under `config.data_dir` and talks HTTP to
    /// `config.api_base_url`.
    pub fn connect(config: &ClientConfig) -> Result<(Self, CooldownTicks), StartupError> {
        std::fs::create_dir_all(&config.data_dir)
            .map_err(|err| StartupError::DataDir(err.to_string()))?;
        let port = SqliteSessionPort::open(config.state_db_path())?;
        let session = Rc::new(SessionStore::open(port)?);
        let gateway = HttpGateway::new(&config.api_base_url)?;
        info!(
            "event=client_connect module=app status=ok base_url={}",
            gateway.base_url()
        );
        Ok(Self::assemble(Rc::new(gateway), session))
    }

    /// Builds the components over an arbitrary gateway and session.
    pub fn assemble(
        gateway: Rc<dyn ApiGateway>,
        session: Rc<SessionStore>,
    ) -> (Self, CooldownTicks) {
        let api = ApiClient::new(gateway, Rc::clone(&session));
        let (auth, ticks) = AuthFlow::new(api.clone());
        let context = Self {
            tasks: TaskStore::new(api.clone()),
            trash: TrashStore::new(api.clone()),
            profile: ProfileService::new(api.clone()),
            session,
            api,
            auth,
        };
        (context, ticks)
    }

    /// Ends the session and forgets the tasks, trash and profile it loaded.
    pub fn logout(&self) -> AuthResult<()> {
        self.auth.logout()?;
        self.tasks.clear();
        self.trash.clear();
        self.profile.clear();
        info!("event=client_logout module=app status=ok");
        Ok(())
    }
}
