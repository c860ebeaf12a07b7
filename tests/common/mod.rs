//! Shared test utilities for integration tests.
//!
//! `FakeBackend` is a scripted [`Transport`]: each route answers from a
//! queue of canned responses (the last one repeats until something new is
//! queued), and every request is recorded so tests can assert on what
//! actually went over the wire.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use budget_sync::config::Config;
use budget_sync::controller::Controller;
use budget_sync::error::{SyncError, SyncResult};
use budget_sync::session::MemoryTokenStore;
use budget_sync::transport::{ApiRequest, ApiResponse, Method, Transport};
use serde_json::{json, Value};
use tokio::sync::Notify;

pub const TOKEN: &str = "test-token";

#[derive(Clone)]
enum Scripted {
    Respond(ApiResponse),
    NetworkError,
    /// Wait on the gate before answering.
    Gated(Arc<Notify>, ApiResponse),
}

#[derive(Default)]
struct Inner {
    /// `(response, served)` per route.
    routes: HashMap<(Method, String), VecDeque<(Scripted, bool)>>,
    requests: Vec<ApiRequest>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<Inner>>,
    /// Signalled whenever a gated request starts waiting.
    parked: Arc<Notify>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, scripted: Scripted) {
        let mut inner = self.inner.lock().unwrap();
        let queue = inner.routes.entry((method, path.to_string())).or_default();
        // A repeating response that was already served gives way to the new one.
        queue.retain(|(_, served)| !served);
        queue.push_back((scripted, false));
    }

    /// Script a fallback answer: it repeats like any other, but the next
    /// response queued for the route replaces it even before it is served.
    pub fn default_ok(&self, method: Method, path: &str, body: Value) {
        let mut inner = self.inner.lock().unwrap();
        let queue = inner.routes.entry((method, path.to_string())).or_default();
        queue.clear();
        queue.push_back((
            Scripted::Respond(ApiResponse::new(200, body.to_string())),
            true,
        ));
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(
            method,
            path,
            Scripted::Respond(ApiResponse::new(status, body.to_string())),
        );
    }

    pub fn ok(&self, method: Method, path: &str, body: Value) {
        self.respond(method, path, 200, body);
    }

    pub fn fail_network(&self, method: Method, path: &str) {
        self.push(method, path, Scripted::NetworkError);
    }

    /// Queue a response that is held back until the returned gate is
    /// notified.
    pub fn gated(&self, method: Method, path: &str, body: Value) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(
            method,
            path,
            Scripted::Gated(gate.clone(), ApiResponse::new(200, body.to_string())),
        );
        gate
    }

    /// Resolves once a gated request is waiting.
    pub async fn wait_parked(&self) {
        self.parked.notified().await;
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method.as_str(), r.path))
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn last_body(&self, method: Method, path: &str) -> Option<Value> {
        self.requests()
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .and_then(|r| r.body.clone())
    }

    pub fn reset_requests(&self) {
        self.inner.lock().unwrap().requests.clear();
    }

    fn next(&self, request: ApiRequest) -> Scripted {
        let mut inner = self.inner.lock().unwrap();
        let key = (request.method, request.path.clone());
        inner.requests.push(request);

        match inner.routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap().0,
            Some(queue) if !queue.is_empty() => {
                let front = queue.front_mut().unwrap();
                front.1 = true;
                front.0.clone()
            }
            _ => Scripted::Respond(ApiResponse::new(
                404,
                json!({"error": "not_found", "message": "No such route"}).to_string(),
            )),
        }
    }
}

impl Transport for FakeBackend {
    async fn send(&self, request: ApiRequest) -> SyncResult<ApiResponse> {
        match self.next(request) {
            Scripted::Respond(response) => Ok(response),
            Scripted::NetworkError => Err(SyncError::Network("connection refused".into())),
            Scripted::Gated(gate, response) => {
                self.parked.notify_one();
                gate.notified().await;
                Ok(response)
            }
        }
    }
}

// =============================================================================
// Canned payloads in the backend's wire format
// =============================================================================

pub fn profile_json() -> Value {
    json!({
        "user_id": 1,
        "username": "ana",
        "email": "ana@example.com",
        "profile_picture_url": null,
        "currency": "RWF"
    })
}

pub fn categories_json() -> Value {
    json!([
        {"category_id": 1, "name": "food", "description": null},
        {"category_id": 2, "name": "Transport", "description": "Bus and taxi"}
    ])
}

pub fn plans_json() -> Value {
    json!([
        {"plan_id": 10, "category_id": 1, "amount": 50000.0, "spent": 31000.0,
         "start_date": "2025-01-01", "end_date": "2025-01-31"}
    ])
}

/// Expense dates come back as timestamps and descriptions may be null,
/// exactly as the list endpoint renders them.
pub fn expenses_json() -> Value {
    json!([
        {"expense_id": 100, "plan_id": 10, "category_id": 1, "category_name": "food",
         "amount": 1000.0, "description": "Lunch", "expense_date": "2025-01-05 00:00:00"},
        {"expense_id": 101, "plan_id": 10, "category_id": 99, "category_name": null,
         "amount": 30000.0, "description": null, "expense_date": "2025-01-06 14:30:00.250000"}
    ])
}

/// Script every list endpoint with healthy data. Anything a test scripts
/// afterwards for the same route takes precedence.
pub fn seed_backend(backend: &FakeBackend) {
    backend.default_ok(Method::Get, "/auth/profile", profile_json());
    backend.default_ok(Method::Get, "/categories/categories", categories_json());
    backend.default_ok(Method::Get, "/budget_plans/budget_plans", plans_json());
    backend.default_ok(Method::Get, "/expenses/expenses", expenses_json());
}

pub fn unauthorized() -> Value {
    json!({"error": "token_invalid"})
}

// =============================================================================
// Controller construction
// =============================================================================

pub struct Harness {
    pub backend: FakeBackend,
    pub tokens: MemoryTokenStore,
    pub controller: Controller<FakeBackend>,
}

impl Harness {
    /// Controller with no persisted token.
    pub fn anonymous() -> Self {
        Self::build(MemoryTokenStore::new(), Config::new("http://backend.test/api"))
    }

    /// Controller restored from a persisted token.
    pub fn logged_in() -> Self {
        let harness = Self::build(
            MemoryTokenStore::with_token(TOKEN),
            Config::new("http://backend.test/api"),
        );
        harness.controller.restore().unwrap();
        harness
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(MemoryTokenStore::new(), config)
    }

    fn build(tokens: MemoryTokenStore, config: Config) -> Self {
        let backend = FakeBackend::new();
        let controller = Controller::new(config, backend.clone(), tokens.clone());
        Self {
            backend,
            tokens,
            controller,
        }
    }
}
