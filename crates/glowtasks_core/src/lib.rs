//! Core client logic for GlowTasks.
//! Owns the auth flow, the task and trash caches, and the session; the UI
//! layer only renders what these expose.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;

pub use api::{ApiClient, ApiError, ApiGateway, ApiRequest, ApiResult, HttpGateway, Method};
pub use app::{ClientContext, StartupError};
pub use auth::{
    AuthError, AuthFlow, AuthMode, AuthResult, AuthState, CooldownTick, CooldownTicks, EntryMode,
    FlowMessages,
};
pub use config::ClientConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::principal::{Principal, ProfileUpdate};
pub use model::task::{Task, TaskField, TaskFilter, TaskId, TrashedTask};
pub use service::{ProfileService, StoreError, StoreResult, TaskStore, TrashStore};
pub use session::{SessionError, SessionPort, SessionStore, Theme};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
