//! Profile of the signed-in user.
//!
//! A username change is written back to the session so later requests carry
//! the new identity.

use super::{StoreError, StoreResult};
use crate::api::ApiClient;
use crate::model::principal::{Principal, ProfileUpdate};
use log::{info, warn};
use std::cell::RefCell;

pub struct ProfileService {
    api: ApiClient,
    profile: RefCell<Option<Principal>>,
    last_error: RefCell<Option<String>>,
}

impl ProfileService {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            profile: RefCell::new(None),
            last_error: RefCell::new(None),
        }
    }

    pub fn profile(&self) -> Option<Principal> {
        self.profile.borrow().clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    pub async fn load(&self) -> StoreResult<Principal> {
        let outcome = self.api.profile().await.map_err(StoreError::from);
        let principal = self.record("load", outcome, "Could not load profile")?;
        *self.profile.borrow_mut() = Some(principal.clone());
        Ok(principal)
    }

    /// Drops the cached profile and the last error. Used when the session ends.
    pub fn clear(&self) {
        *self.profile.borrow_mut() = None;
        *self.last_error.borrow_mut() = None;
    }

    /// Saves username and photo. `profile_image: None` removes the photo.
    ///
    /// The cached profile follows the server as soon as it accepts the
    /// update, even when writing the new name to the session then fails.
    pub async fn update(
        &self,
        username: &str,
        profile_image: Option<String>,
    ) -> StoreResult<Principal> {
        let outcome = self.update_inner(username, profile_image).await;
        self.record("update", outcome, "Could not update profile")
    }

    async fn update_inner(
        &self,
        username: &str,
        profile_image: Option<String>,
    ) -> StoreResult<Principal> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::Validation("Username is required".to_string()));
        }
        let update = ProfileUpdate {
            username: username.to_string(),
            profile_image,
        };
        let principal = self.api.update_profile(&update).await?;
        *self.profile.borrow_mut() = Some(principal.clone());

        let session = self.api.session();
        if session.identity().as_deref() != Some(principal.username.as_str()) {
            session.rename(&principal.username)?;
            info!("event=profile_rename module=profile status=ok");
        }
        Ok(principal)
    }

    fn record<T>(&self, op: &'static str, outcome: StoreResult<T>, fallback: &str) -> StoreResult<T> {
        match &outcome {
            Ok(_) => *self.last_error.borrow_mut() = None,
            Err(err) => {
                warn!("event=profile_{op} module=profile status=error error={err}");
                *self.last_error.borrow_mut() = Some(err.user_message(fallback));
            }
        }
        outcome
    }
}
