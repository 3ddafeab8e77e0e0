#![allow(dead_code)]

//! In-memory task service used by the integration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glowtasks_core::api::interpret_response;
use glowtasks_core::{
    ApiGateway, ApiRequest, ApiResult, ClientContext, CooldownTicks, Method, SessionStore,
};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tokio::sync::Notify;

struct User {
    username: String,
    email: String,
    password: String,
    verified: bool,
    profile_image: Option<String>,
}

struct StoredTask {
    id: i64,
    owner: String,
    title: String,
    description: String,
    completed: bool,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl StoredTask {
    fn to_json(&self) -> Value {
        let mut value = json!({
            "id": self.id,
            "title": self.title,
            "description": self.description,
            "completed": self.completed,
            "createdAt": self.created_at.timestamp_millis(),
        });
        if let Some(deleted_at) = self.deleted_at {
            value["deletedAt"] = Value::String(deleted_at.to_rfc3339());
        }
        value
    }
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    otps: HashMap<String, String>,
    tasks: Vec<StoredTask>,
    next_task_id: i64,
    next_otp: u32,
}

impl State {
    fn issue_otp(&mut self, email: &str) {
        self.next_otp += 1;
        self.otps
            .insert(email.to_string(), format!("{:06}", 100_000 + self.next_otp));
    }

    fn take_otp(&mut self, email: &str, otp: &str) -> bool {
        if self.otps.get(email).map(String::as_str) == Some(otp) {
            self.otps.remove(email);
            return true;
        }
        false
    }

    fn user_by_name(&mut self, username: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|user| user.username == username)
    }

    fn owned_task(&mut self, owner: &str, id: &str) -> Option<&mut StoredTask> {
        let id: i64 = id.parse().ok()?;
        self.tasks
            .iter_mut()
            .find(|task| task.id == id && task.owner == owner)
    }
}

type Reply = (u16, String);

fn ok(body: Value) -> Reply {
    (200, body.to_string())
}

fn fail(status: u16, message: &str) -> Reply {
    (status, json!({ "message": message }).to_string())
}

fn text(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Fake task service speaking the same JSON contract as the real one.
#[derive(Default)]
pub struct FakeBackend {
    state: RefCell<State>,
    requests: RefCell<Vec<ApiRequest>>,
    injected: RefCell<Option<Reply>>,
    targeted: RefCell<Option<(String, Reply)>>,
    held: Cell<bool>,
    gate: Notify,
}

impl FakeBackend {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Adds an already verified account.
    pub fn seed_user(&self, username: &str, email: &str, password: &str) {
        self.state.borrow_mut().users.push(User {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            verified: true,
            profile_image: None,
        });
    }

    pub fn seed_task(&self, owner: &str, title: &str) -> i64 {
        let mut state = self.state.borrow_mut();
        state.next_task_id += 1;
        let id = state.next_task_id;
        state.tasks.push(StoredTask {
            id,
            owner: owner.to_string(),
            title: title.to_string(),
            description: String::new(),
            completed: false,
            created_at: Utc::now(),
            deleted_at: None,
        });
        id
    }

    pub fn otp_for(&self, email: &str) -> Option<String> {
        self.state.borrow().otps.get(email).cloned()
    }

    pub fn is_verified(&self, email: &str) -> bool {
        self.state
            .borrow()
            .users
            .iter()
            .any(|user| user.email == email && user.verified)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    /// `METHOD path` of every request so far.
    pub fn calls(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|request| format!("{} {}", request.method, request.path))
            .collect()
    }

    /// The next request gets this raw status and body instead of being served.
    pub fn fail_next(&self, status: u16, body: &str) {
        *self.injected.borrow_mut() = Some((status, body.to_string()));
    }

    /// The next request matching `call` (`METHOD path`) gets this raw status
    /// and body. Other requests are served normally.
    pub fn fail_call(&self, call: &str, status: u16, body: &str) {
        *self.targeted.borrow_mut() = Some((call.to_string(), (status, body.to_string())));
    }

    /// Parks every following request until [`FakeBackend::release`].
    pub fn hold(&self) {
        self.held.set(true);
    }

    pub fn release(&self) {
        self.held.set(false);
        self.gate.notify_one();
    }

    fn serve(&self, request: &ApiRequest) -> Reply {
        if let Some(reply) = self.injected.borrow_mut().take() {
            return reply;
        }
        let call = format!("{} {}", request.method, request.path);
        let hit = matches!(&*self.targeted.borrow(), Some((target, _)) if *target == call);
        if hit {
            if let Some((_, reply)) = self.targeted.borrow_mut().take() {
                return reply;
            }
        }
        let body = request.body.clone().unwrap_or_else(|| json!({}));
        let segments: Vec<&str> = request
            .path
            .trim_start_matches('/')
            .split('/')
            .collect();
        let identity = request.identity.as_deref();

        match (request.method, segments.as_slice()) {
            (Method::Post, ["api", "auth", "register"]) => self.register(&body),
            (Method::Post, ["api", "auth", "verify-otp"]) => self.verify(&body),
            (Method::Post, ["api", "auth", "resend-verify"]) => self.resend_verify(&body),
            (Method::Post, ["api", "auth", "login"]) => self.login(&body),
            (Method::Post, ["api", "auth", "forgot"]) => self.forgot(&body),
            (Method::Post, ["api", "auth", "reset"]) => self.reset(&body),
            (_, ["api", ..]) if identity.is_none() => fail(401, "Not authenticated"),
            (Method::Get, ["api", "auth", "me"]) => self.me(identity.unwrap_or_default()),
            (Method::Put, ["api", "auth", "me"]) => {
                self.update_me(identity.unwrap_or_default(), &body)
            }
            (Method::Get, ["api", "tasks"]) => self.list(identity.unwrap_or_default(), false),
            (Method::Post, ["api", "tasks"]) => self.create(identity.unwrap_or_default(), &body),
            (Method::Put, ["api", "tasks", id, "toggle"]) => {
                self.toggle(identity.unwrap_or_default(), id)
            }
            (Method::Put, ["api", "tasks", id]) => {
                self.edit(identity.unwrap_or_default(), id, &body)
            }
            (Method::Delete, ["api", "tasks", id]) => {
                self.trash(identity.unwrap_or_default(), id)
            }
            (Method::Get, ["api", "trash"]) => self.list(identity.unwrap_or_default(), true),
            (Method::Post, ["api", "trash", "restore"]) => {
                self.restore(identity.unwrap_or_default(), &body)
            }
            _ => (404, "<html>Not Found</html>".to_string()),
        }
    }

    fn register(&self, body: &Value) -> Reply {
        let email = text(body, "email");
        let mut state = self.state.borrow_mut();
        if state.users.iter().any(|user| user.email == email) {
            return fail(400, "Email already registered");
        }
        state.users.push(User {
            username: text(body, "username"),
            email: email.clone(),
            password: text(body, "password"),
            verified: false,
            profile_image: None,
        });
        state.issue_otp(&email);
        (201, json!({ "message": "OTP sent" }).to_string())
    }

    fn verify(&self, body: &Value) -> Reply {
        let email = text(body, "email");
        let mut state = self.state.borrow_mut();
        if !state.take_otp(&email, &text(body, "otp")) {
            return fail(400, "Invalid or expired OTP");
        }
        if let Some(user) = state.users.iter_mut().find(|user| user.email == email) {
            user.verified = true;
        }
        ok(json!({ "message": "Email verified" }))
    }

    fn resend_verify(&self, body: &Value) -> Reply {
        let email = text(body, "email");
        self.state.borrow_mut().issue_otp(&email);
        ok(json!({ "message": "OTP resent" }))
    }

    fn login(&self, body: &Value) -> Reply {
        let identifier = text(body, "identifier");
        let password = text(body, "password");
        let state = self.state.borrow();
        let Some(user) = state
            .users
            .iter()
            .find(|user| user.username == identifier || user.email == identifier)
        else {
            return fail(401, "Invalid credentials");
        };
        if user.password != password {
            return fail(401, "Invalid credentials");
        }
        if !user.verified {
            return fail(403, "Please verify your email first");
        }
        ok(json!({ "username": user.username }))
    }

    fn forgot(&self, body: &Value) -> Reply {
        let email = text(body, "email");
        let mut state = self.state.borrow_mut();
        if state.users.iter().any(|user| user.email == email) {
            state.issue_otp(&email);
        }
        ok(json!({ "message": "If this email exists, an OTP has been sent" }))
    }

    fn reset(&self, body: &Value) -> Reply {
        let email = text(body, "email");
        let mut state = self.state.borrow_mut();
        if !state.take_otp(&email, &text(body, "otp")) {
            return fail(400, "Invalid or expired OTP");
        }
        let password = text(body, "newPassword");
        if let Some(user) = state.users.iter_mut().find(|user| user.email == email) {
            user.password = password;
        }
        ok(json!({ "message": "Password updated" }))
    }

    fn me(&self, identity: &str) -> Reply {
        let mut state = self.state.borrow_mut();
        match state.user_by_name(identity) {
            Some(user) => ok(json!({
                "username": user.username,
                "email": user.email,
                "profileImage": user.profile_image,
                "createdAt": "2026-01-05T10:00:00Z",
            })),
            None => fail(404, "User not found"),
        }
    }

    fn update_me(&self, identity: &str, body: &Value) -> Reply {
        let username = text(body, "username");
        let profile_image = body
            .get("profileImage")
            .and_then(Value::as_str)
            .map(str::to_string);
        let mut state = self.state.borrow_mut();
        let Some(user) = state.user_by_name(identity) else {
            return fail(404, "User not found");
        };
        user.username = username.clone();
        user.profile_image = profile_image;
        for task in state.tasks.iter_mut().filter(|task| task.owner == identity) {
            task.owner = username.clone();
        }
        drop(state);
        self.me(&username)
    }

    fn list(&self, identity: &str, trashed: bool) -> Reply {
        let state = self.state.borrow();
        let items: Vec<Value> = state
            .tasks
            .iter()
            .filter(|task| task.owner == identity && task.deleted_at.is_some() == trashed)
            .map(StoredTask::to_json)
            .collect();
        ok(Value::Array(items))
    }

    fn create(&self, identity: &str, body: &Value) -> Reply {
        let title = text(body, "title");
        if title.trim().is_empty() {
            return fail(400, "Title is required");
        }
        let mut state = self.state.borrow_mut();
        state.next_task_id += 1;
        let task = StoredTask {
            id: state.next_task_id,
            owner: identity.to_string(),
            title,
            description: text(body, "description"),
            completed: false,
            created_at: Utc::now(),
            deleted_at: None,
        };
        let reply = (201, task.to_json().to_string());
        state.tasks.push(task);
        reply
    }

    fn toggle(&self, identity: &str, id: &str) -> Reply {
        let mut state = self.state.borrow_mut();
        match state.owned_task(identity, id) {
            Some(task) if task.deleted_at.is_none() => {
                task.completed = !task.completed;
                ok(task.to_json())
            }
            _ => fail(404, "Task not found"),
        }
    }

    fn edit(&self, identity: &str, id: &str, body: &Value) -> Reply {
        let mut state = self.state.borrow_mut();
        match state.owned_task(identity, id) {
            Some(task) if task.deleted_at.is_none() => {
                if let Some(title) = body.get("title").and_then(Value::as_str) {
                    task.title = title.to_string();
                }
                if let Some(description) = body.get("description").and_then(Value::as_str) {
                    task.description = description.to_string();
                }
                ok(task.to_json())
            }
            _ => fail(404, "Task not found"),
        }
    }

    fn trash(&self, identity: &str, id: &str) -> Reply {
        let mut state = self.state.borrow_mut();
        match state.owned_task(identity, id) {
            Some(task) if task.deleted_at.is_none() => {
                task.deleted_at = Some(Utc::now());
                ok(json!({ "message": "Moved to trash" }))
            }
            _ => fail(404, "Task not found"),
        }
    }

    fn restore(&self, identity: &str, body: &Value) -> Reply {
        let ids: Vec<i64> = body
            .get("ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();
        let mut state = self.state.borrow_mut();
        for id in ids {
            if let Some(task) = state.owned_task(identity, &id.to_string()) {
                task.deleted_at = None;
            }
        }
        ok(json!({ "message": "Restored" }))
    }
}

#[async_trait(?Send)]
impl ApiGateway for FakeBackend {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        self.requests.borrow_mut().push(request.clone());
        if self.held.get() {
            self.gate.notified().await;
        }
        let (status, body) = self.serve(&request);
        interpret_response(status, &body)
    }
}

/// Client over `backend` with a fresh, signed-out in-memory session.
pub fn client(backend: &Rc<FakeBackend>) -> (ClientContext, CooldownTicks) {
    client_with_session(backend, SessionStore::in_memory())
}

pub fn client_with_session(
    backend: &Rc<FakeBackend>,
    session: SessionStore,
) -> (ClientContext, CooldownTicks) {
    let gateway: Rc<dyn ApiGateway> = backend.clone();
    ClientContext::assemble(gateway, Rc::new(session))
}

/// Client already signed in as `username`, which exists on `backend`.
pub fn signed_in(backend: &Rc<FakeBackend>, username: &str) -> (ClientContext, CooldownTicks) {
    backend.seed_user(username, &format!("{username}@example.com"), "secret");
    let session = SessionStore::in_memory();
    session.sign_in(username).unwrap();
    client_with_session(backend, session)
}
