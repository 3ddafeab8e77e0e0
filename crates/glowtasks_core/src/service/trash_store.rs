//! Trash cache with selection and batch restore.
//!
//! # Invariants
//! - Every `load` clears the selection.
//! - Only cached ids can be selected; selection keeps click order.
//! - A confirmed restore always reloads both the active tasks and the trash,
//!   so a restored task shows up in exactly one collection.

use super::task_store::TaskStore;
use super::{StoreError, StoreResult};
use crate::api::ApiClient;
use crate::model::task::{TaskId, TrashedTask};
use log::{debug, info, warn};
use std::cell::RefCell;

pub struct TrashStore {
    api: ApiClient,
    items: RefCell<Vec<TrashedTask>>,
    selected: RefCell<Vec<TaskId>>,
    last_error: RefCell<Option<String>>,
}

impl TrashStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            items: RefCell::new(Vec::new()),
            selected: RefCell::new(Vec::new()),
            last_error: RefCell::new(None),
        }
    }

    pub fn items(&self) -> Vec<TrashedTask> {
        self.items.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<TrashedTask> {
        self.items.borrow().iter().find(|item| item.id() == id).cloned()
    }

    /// Resolves a user-typed id against the cached trash.
    pub fn find_id(&self, label: &str) -> Option<TaskId> {
        let label = label.trim();
        self.items
            .borrow()
            .iter()
            .find(|item| item.id().to_string() == label)
            .map(|item| item.id().clone())
    }

    pub fn selected(&self) -> Vec<TaskId> {
        self.selected.borrow().clone()
    }

    pub fn is_selected(&self, id: &TaskId) -> bool {
        self.selected.borrow().contains(id)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    /// Replaces the cache with the server's trash and clears the selection.
    pub async fn load(&self) -> StoreResult<usize> {
        let outcome = self.api.list_trash().await.map_err(StoreError::from);
        let items = self.record("load", outcome, "Could not load trash")?;
        let count = items.len();
        *self.items.borrow_mut() = items;
        self.selected.borrow_mut().clear();
        info!("event=trash_load module=trash status=ok count={count}");
        Ok(count)
    }

    /// Adds `id` to the selection. Returns whether the selection changed.
    pub fn select(&self, id: &TaskId) -> bool {
        if self.get(id).is_none() || self.is_selected(id) {
            return false;
        }
        self.selected.borrow_mut().push(id.clone());
        true
    }

    /// Removes `id` from the selection. Returns whether the selection changed.
    pub fn deselect(&self, id: &TaskId) -> bool {
        let mut selected = self.selected.borrow_mut();
        let before = selected.len();
        selected.retain(|candidate| candidate != id);
        selected.len() != before
    }

    /// Flips membership of `id`; returns the new membership.
    pub fn toggle_selection(&self, id: &TaskId) -> bool {
        if self.is_selected(id) {
            self.deselect(id);
            false
        } else {
            self.select(id)
        }
    }

    /// Restores every selected task, then reloads `tasks` and the trash.
    ///
    /// An empty selection is a no-op and sends nothing. Returns the number of
    /// ids sent for restore. Once the server confirmed the restore, the
    /// restored ids leave the selection and the trash cache even if a reload
    /// fails; reload failures land in the owning store's `last_error`.
    pub async fn restore_selected(&self, tasks: &TaskStore) -> StoreResult<usize> {
        let ids = self.selected();
        if ids.is_empty() {
            debug!("event=trash_restore module=trash status=skipped reason=empty_selection");
            return Ok(0);
        }

        let outcome = self.api.restore(&ids).await.map_err(StoreError::from);
        self.record("restore", outcome, "Could not restore")?;
        self.selected.borrow_mut().retain(|id| !ids.contains(id));
        self.items
            .borrow_mut()
            .retain(|item| !ids.contains(item.id()));
        info!(
            "event=trash_restore module=trash status=ok count={}",
            ids.len()
        );

        let tasks_reloaded = tasks.load().await.is_ok();
        let trash_reloaded = self.load().await.is_ok();
        if !(tasks_reloaded && trash_reloaded) {
            warn!(
                "event=trash_restore_reload module=trash status=error tasks_ok={tasks_reloaded} trash_ok={trash_reloaded}"
            );
        }
        Ok(ids.len())
    }

    /// Drops cached items, selection and error. Used when the session ends.
    pub fn clear(&self) {
        self.items.borrow_mut().clear();
        self.selected.borrow_mut().clear();
        *self.last_error.borrow_mut() = None;
    }

    fn record<T>(&self, op: &'static str, outcome: StoreResult<T>, fallback: &str) -> StoreResult<T> {
        match &outcome {
            Ok(_) => *self.last_error.borrow_mut() = None,
            Err(err) => {
                warn!("event=trash_{op} module=trash status=error error={err}");
                *self.last_error.borrow_mut() = Some(err.user_message(fallback));
            }
        }
        outcome
    }
}
