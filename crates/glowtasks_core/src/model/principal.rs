//! Authenticated principal (profile) model.

use crate::model::wire_time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile of the signed-in user.
///
/// `username` doubles as the identity sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Opaque image reference (usually a data URL). Never decoded here.
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default, with = "wire_time::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of a profile update.
///
/// `profile_image: None` is serialized as `null` and removes the photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: String,
    pub profile_image: Option<String>,
}
