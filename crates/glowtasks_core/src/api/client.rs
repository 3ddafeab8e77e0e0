//! Typed endpoint calls over an [`ApiGateway`].
//!
//! # Invariants
//! - The identity is read from the session at call time, per request.
//! - Secrets (passwords, OTPs) only ever appear in request bodies.
//! - Task ids are percent-encoded as a single path segment.

use super::gateway::{ApiGateway, ApiRequest, Method};
use super::{ApiError, ApiResult};
use crate::model::principal::{Principal, ProfileUpdate};
use crate::model::task::{Task, TaskField, TaskId, TrashedTask};
use crate::session::SessionStore;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::rc::Rc;

/// Body returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub username: String,
}

/// Cheap-to-clone handle shared by the auth flow and the stores.
#[derive(Clone)]
pub struct ApiClient {
    gateway: Rc<dyn ApiGateway>,
    session: Rc<SessionStore>,
}

impl ApiClient {
    pub fn new(gateway: Rc<dyn ApiGateway>, session: Rc<SessionStore>) -> Self {
        Self { gateway, session }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> ApiResult<()> {
        let body = json!({ "username": username, "email": email, "password": password });
        self.anonymous(Method::Post, "/api/auth/register", body)
            .await
            .map(drop)
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> ApiResult<()> {
        let body = json!({ "email": email, "otp": otp });
        self.anonymous(Method::Post, "/api/auth/verify-otp", body)
            .await
            .map(drop)
    }

    pub async fn resend_verify(&self, email: &str) -> ApiResult<()> {
        self.anonymous(Method::Post, "/api/auth/resend-verify", json!({ "email": email }))
            .await
            .map(drop)
    }

    pub async fn login(&self, identifier: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = json!({ "identifier": identifier, "password": password });
        decode(self.anonymous(Method::Post, "/api/auth/login", body).await?)
    }

    /// Requests a password-reset code. The server answers identically whether
    /// or not the email exists.
    pub async fn forgot(&self, email: &str) -> ApiResult<()> {
        self.anonymous(Method::Post, "/api/auth/forgot", json!({ "email": email }))
            .await
            .map(drop)
    }

    pub async fn reset(&self, email: &str, otp: &str, new_password: &str) -> ApiResult<()> {
        let body = json!({ "email": email, "otp": otp, "newPassword": new_password });
        self.anonymous(Method::Post, "/api/auth/reset", body)
            .await
            .map(drop)
    }

    pub async fn profile(&self) -> ApiResult<Principal> {
        decode(self.authorized(Method::Get, "/api/auth/me", None).await?)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Principal> {
        let body = serde_json::to_value(update).map_err(|err| ApiError::Decode(err.to_string()))?;
        decode(
            self.authorized(Method::Put, "/api/auth/me", Some(body))
                .await?,
        )
    }

    pub async fn list_tasks(&self) -> ApiResult<Vec<Task>> {
        decode(self.authorized(Method::Get, "/api/tasks", None).await?)
    }

    pub async fn add_task(&self, title: &str, description: &str) -> ApiResult<Task> {
        let body = json!({ "title": title, "description": description });
        decode(self.authorized(Method::Post, "/api/tasks", Some(body)).await?)
    }

    /// Partial update of a single text field.
    pub async fn update_task(&self, id: &TaskId, field: TaskField, value: &str) -> ApiResult<Task> {
        let mut body = Map::new();
        body.insert(field.wire_name().to_string(), Value::String(value.to_string()));
        let path = task_path(id, "");
        decode(
            self.authorized(Method::Put, &path, Some(Value::Object(body)))
                .await?,
        )
    }

    pub async fn toggle_task(&self, id: &TaskId) -> ApiResult<Task> {
        let path = task_path(id, "/toggle");
        decode(self.authorized(Method::Put, &path, Some(json!({}))).await?)
    }

    /// Moves the task to the trash on the server side.
    pub async fn delete_task(&self, id: &TaskId) -> ApiResult<()> {
        let path = task_path(id, "");
        self.authorized(Method::Delete, &path, None).await.map(drop)
    }

    pub async fn list_trash(&self) -> ApiResult<Vec<TrashedTask>> {
        decode(self.authorized(Method::Get, "/api/trash", None).await?)
    }

    pub async fn restore(&self, ids: &[TaskId]) -> ApiResult<()> {
        let body = json!({ "ids": ids });
        self.authorized(Method::Post, "/api/trash/restore", Some(body))
            .await
            .map(drop)
    }

    async fn anonymous(&self, method: Method, path: &str, body: Value) -> ApiResult<Value> {
        self.gateway
            .send(ApiRequest::new(method, path).with_body(body))
            .await
    }

    async fn authorized(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<Value> {
        let identity = self.session.identity().ok_or(ApiError::MissingIdentity)?;
        let mut request = ApiRequest::new(method, path).with_identity(identity);
        if let Some(body) = body {
            request = request.with_body(body);
        }
        self.gateway.send(request).await
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|err| ApiError::Decode(err.to_string()))
}

fn task_path(id: &TaskId, suffix: &str) -> String {
    format!("/api/tasks/{}{suffix}", urlencoding::encode(&id.to_string()))
}
