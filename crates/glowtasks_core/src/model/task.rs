//! Task and trash entry model.
//!
//! # Responsibility
//! - Define the canonical task record returned by the task service.
//! - Provide presentation helpers (filters, editable fields, retention).
//!
//! # Invariants
//! - `TaskId` is opaque: it keeps the wire form (text or integer) untouched so
//!   it can be echoed back to the server verbatim.
//! - `created_at` and `deleted_at` are assigned by the server only.

use crate::model::wire_time;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Days a trashed task is retained by the server before purge.
pub const TRASH_RETENTION_DAYS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
enum RawTaskId {
    Number(i64),
    Text(String),
}

/// Server-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(RawTaskId);

impl TaskId {
    pub fn text(value: impl Into<String>) -> Self {
        Self(RawTaskId::Text(value.into()))
    }

    pub fn number(value: i64) -> Self {
        Self(RawTaskId::Number(value))
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            RawTaskId::Number(value) => write!(f, "{value}"),
            RawTaskId::Text(value) => f.write_str(value),
        }
    }
}

/// One active task as returned by the task service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "wire_time")]
    pub created_at: DateTime<Utc>,
}

/// A soft-deleted task, recoverable until the server purges it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashedTask {
    #[serde(flatten)]
    pub task: Task,
    #[serde(with = "wire_time")]
    pub deleted_at: DateTime<Utc>,
}

impl TrashedTask {
    pub fn id(&self) -> &TaskId {
        &self.task.id
    }

    /// Expected purge time. Display only; the server enforces retention.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.deleted_at + Duration::days(TRASH_RETENTION_DAYS)
    }
}

/// Editable text field of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
}

impl TaskField {
    /// JSON key used by the partial update endpoint.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
        }
    }
}

impl FromStr for TaskField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "description" | "desc" => Ok(Self::Description),
            other => Err(format!(
                "unsupported task field `{other}`; expected title|description"
            )),
        }
    }
}

/// Presentation filter over the cached task sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Done,
    Todo,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Done => task.completed,
            Self::Todo => !task.completed,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "done" => Ok(Self::Done),
            "todo" => Ok(Self::Todo),
            other => Err(format!(
                "unsupported filter `{other}`; expected all|done|todo"
            )),
        }
    }
}
