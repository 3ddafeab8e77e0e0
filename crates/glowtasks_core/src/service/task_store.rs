//! Active task cache.
//!
//! # Responsibility
//! - Keep the signed-in user's active tasks in display order.
//! - Route create/toggle/edit/delete through the server and apply the
//!   server's canonical result.
//! - Provide filter and count projections for presentation.
//!
//! # Invariants
//! - Entries are replaced by id with the server's copy, never patched locally.
//! - `reorder` is local only; a reload restores server order.
//! - Projections never mutate the cache.

use super::{StoreError, StoreResult};
use crate::api::ApiClient;
use crate::model::task::{Task, TaskField, TaskFilter, TaskId};
use log::{info, warn};
use std::cell::RefCell;

pub struct TaskStore {
    api: ApiClient,
    tasks: RefCell<Vec<Task>>,
    last_error: RefCell<Option<String>>,
}

impl TaskStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            tasks: RefCell::new(Vec::new()),
            last_error: RefCell::new(None),
        }
    }

    /// Snapshot of the cache in display order.
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.borrow().clone()
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.borrow().iter().find(|task| &task.id == id).cloned()
    }

    /// Resolves a user-typed id against the cache.
    pub fn find_id(&self, label: &str) -> Option<TaskId> {
        let label = label.trim();
        self.tasks
            .borrow()
            .iter()
            .find(|task| task.id.to_string() == label)
            .map(|task| task.id.clone())
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.borrow().iter().filter(|task| task.completed).count()
    }

    pub fn pending_count(&self) -> usize {
        self.len() - self.completed_count()
    }

    pub fn filtered(&self, filter: TaskFilter) -> Vec<Task> {
        self.tasks
            .borrow()
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    /// Drops the cache and the last error. Used when the session ends.
    pub fn clear(&self) {
        self.tasks.borrow_mut().clear();
        *self.last_error.borrow_mut() = None;
    }

    /// Replaces the cache with the server's active collection.
    pub async fn load(&self) -> StoreResult<usize> {
        let outcome = self.api.list_tasks().await.map_err(StoreError::from);
        let tasks = self.record("load", outcome, "Could not load tasks")?;
        let count = tasks.len();
        *self.tasks.borrow_mut() = tasks;
        info!("event=tasks_load module=tasks status=ok count={count}");
        Ok(count)
    }

    /// Creates a task and appends it. A blank title is a no-op (`Ok(None)`).
    pub async fn add(&self, title: &str, description: &str) -> StoreResult<Option<Task>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }
        let outcome = self
            .api
            .add_task(title, description)
            .await
            .map_err(StoreError::from);
        let task = self.record("add", outcome, "Could not add task")?;
        self.tasks.borrow_mut().push(task.clone());
        info!("event=tasks_add module=tasks status=ok task_id={}", task.id);
        Ok(Some(task))
    }

    /// Flips `completed` on the server and adopts the returned task.
    pub async fn toggle(&self, id: &TaskId) -> StoreResult<Task> {
        let outcome = self.api.toggle_task(id).await.map_err(StoreError::from);
        let task = self.record("toggle", outcome, "Could not update")?;
        self.replace(&task);
        Ok(task)
    }

    /// Partial update of one text field.
    pub async fn update(&self, id: &TaskId, field: TaskField, value: &str) -> StoreResult<Task> {
        let outcome = self
            .api
            .update_task(id, field, value)
            .await
            .map_err(StoreError::from);
        let task = self.record("update", outcome, "Could not edit")?;
        self.replace(&task);
        Ok(task)
    }

    /// Deletes on the server (which moves the task to trash), then drops it
    /// from the cache.
    pub async fn delete(&self, id: &TaskId) -> StoreResult<()> {
        let outcome = self.api.delete_task(id).await.map_err(StoreError::from);
        self.record("delete", outcome, "Could not delete")?;
        self.tasks.borrow_mut().retain(|task| &task.id != id);
        info!("event=tasks_delete module=tasks status=ok task_id={id}");
        Ok(())
    }

    /// Moves `dragged` to the index currently held by `target`.
    ///
    /// Returns `false` (and leaves the order alone) when the ids are equal or
    /// either is not cached. The new order is not sent to the server.
    pub fn reorder(&self, dragged: &TaskId, target: &TaskId) -> bool {
        if dragged == target {
            return false;
        }
        let mut tasks = self.tasks.borrow_mut();
        let from = tasks.iter().position(|task| &task.id == dragged);
        let to = tasks.iter().position(|task| &task.id == target);
        let (Some(from), Some(to)) = (from, to) else {
            return false;
        };
        let moved = tasks.remove(from);
        tasks.insert(to, moved);
        true
    }

    /// Entries deleted meanwhile stay deleted; the server copy is dropped.
    fn replace(&self, updated: &Task) {
        if let Some(slot) = self
            .tasks
            .borrow_mut()
            .iter_mut()
            .find(|task| task.id == updated.id)
        {
            *slot = updated.clone();
        }
    }

    fn record<T>(&self, op: &'static str, outcome: StoreResult<T>, fallback: &str) -> StoreResult<T> {
        match &outcome {
            Ok(_) => *self.last_error.borrow_mut() = None,
            Err(err) => {
                warn!("event=tasks_{op} module=tasks status=error error={err}");
                *self.last_error.borrow_mut() = Some(err.user_message(fallback));
            }
        }
        outcome
    }
}
