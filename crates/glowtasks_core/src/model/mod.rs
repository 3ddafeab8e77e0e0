//! Client-side domain model for tasks, trash entries and principals.
//!
//! # Responsibility
//! - Define the wire-compatible shapes exchanged with the task service.
//! - Keep identifiers opaque; the server owns id and timestamp assignment.
//!
//! # Invariants
//! - A task id is stable for the task's lifetime and unique per user.
//! - A task lives in exactly one of the active or trash collections.
//!
//! # See also
//! - `crate::service::task_store`, `crate::service::trash_store`

pub mod principal;
pub mod task;
pub mod wire_time;
