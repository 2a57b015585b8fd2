//! In-process stand-in for the portal REST API.
//!
//! The stub issues numbered tokens, lets a scenario expire or revoke them,
//! and records what the client sent so steps can assert on refresh counts and
//! trace propagation. It runs on Actix inside a `LocalSet`, so the owner must
//! drive every request through [`StubServer::block_on`].

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::net::TcpListener;
use std::sync::{Arc, Mutex, MutexGuard};

use actix_web::dev::ServerHandle;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

use portal_client::domain::TRACE_ID_HEADER;

pub const VALID_PASSWORD: &str = "secret1";

#[derive(Default)]
struct StubState {
    issued: usize,
    access: HashSet<String>,
    refresh: HashSet<String>,
    refresh_calls: usize,
    hits: HashMap<String, usize>,
    trace_ids: HashMap<String, Vec<String>>,
    reject_logout: bool,
}

/// Shared handle on the stub's state.
#[derive(Clone, Default)]
pub struct StubBackend {
    state: Arc<Mutex<StubState>>,
}

impl StubBackend {
    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().expect("stub state lock")
    }

    pub fn expire_access_tokens(&self) {
        self.state().access.clear();
    }

    pub fn revoke_refresh_tokens(&self) {
        self.state().refresh.clear();
    }

    pub fn reject_logout(&self) {
        self.state().reject_logout = true;
    }

    pub fn refresh_calls(&self) -> usize {
        self.state().refresh_calls
    }

    pub fn hits(&self, route: &str) -> usize {
        self.state().hits.get(route).copied().unwrap_or_default()
    }

    /// Trace ids seen on `route`, in arrival order.
    pub fn trace_ids(&self, route: &str) -> Vec<String> {
        self.state()
            .trace_ids
            .get(route)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, route: &str, request: &HttpRequest) {
        let mut state = self.state();
        *state.hits.entry(route.to_owned()).or_default() += 1;
        if let Some(trace_id) = request
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            state
                .trace_ids
                .entry(route.to_owned())
                .or_default()
                .push(trace_id.to_owned());
        }
    }

    fn issue_pair(&self) -> (String, String) {
        let mut state = self.state();
        state.issued += 1;
        let access = format!("access-{}", state.issued);
        let refresh = format!("refresh-{}", state.issued);
        state.access.insert(access.clone());
        state.refresh.insert(refresh.clone());
        (access, refresh)
    }

    fn issue_access(&self) -> String {
        let mut state = self.state();
        state.issued += 1;
        let access = format!("access-{}", state.issued);
        state.access.insert(access.clone());
        access
    }

    fn authorised(&self, request: &HttpRequest) -> bool {
        bearer(request).is_some_and(|token| self.state().access.contains(token))
    }
}

fn bearer(request: &HttpRequest) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn customer_json() -> Value {
    json!({
        "id": "u-1",
        "role": "customer",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com"
    })
}

fn rejected(message: &str) -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "message": message }))
}

async fn login(
    backend: web::Data<StubBackend>,
    request: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    backend.record("/auth/login", &request);
    if body.get("password").and_then(Value::as_str) != Some(VALID_PASSWORD) {
        return rejected("Invalid email or password");
    }
    let (access, refresh) = backend.issue_pair();
    HttpResponse::Ok().json(json!({
        "accessToken": access,
        "refreshToken": refresh,
        "user": customer_json(),
    }))
}

async fn refresh(
    backend: web::Data<StubBackend>,
    request: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    backend.record("/auth/refresh", &request);
    let presented = body
        .get("refreshToken")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let known = {
        let mut state = backend.state();
        state.refresh_calls += 1;
        state.refresh.contains(&presented)
    };
    if !known {
        return rejected("refresh token revoked");
    }
    HttpResponse::Ok().json(json!({ "accessToken": backend.issue_access() }))
}

async fn me(backend: web::Data<StubBackend>, request: HttpRequest) -> HttpResponse {
    backend.record("/auth/me", &request);
    if !backend.authorised(&request) {
        return rejected("jwt expired");
    }
    HttpResponse::Ok().json(json!({ "user": customer_json() }))
}

async fn logout(backend: web::Data<StubBackend>, request: HttpRequest) -> HttpResponse {
    backend.record("/auth/logout", &request);
    if backend.state().reject_logout {
        return HttpResponse::InternalServerError().json(json!({ "message": "logout failed" }));
    }
    HttpResponse::Ok().json(json!({ "message": "Logged out" }))
}

async fn quotes(backend: web::Data<StubBackend>, request: HttpRequest) -> HttpResponse {
    backend.record("/quotes", &request);
    if !backend.authorised(&request) {
        return rejected("jwt expired");
    }
    HttpResponse::Ok().json(json!({ "quotes": [] }))
}

/// Running stub plus the single-threaded runtime that drives it.
pub struct StubServer {
    runtime: Runtime,
    local: LocalSet,
    base_url: String,
    handle: ServerHandle,
    backend: StubBackend,
}

impl StubServer {
    pub fn start() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        let local = LocalSet::new();
        let backend = StubBackend::default();
        let (base_url, handle) = local
            .block_on(&runtime, spawn(backend.clone()))
            .expect("stub server starts");
        Self {
            runtime,
            local,
            base_url,
            handle,
            backend,
        }
    }

    /// API base URL, including the `/api` prefix.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn backend(&self) -> &StubBackend {
        &self.backend
    }

    /// Drive `future` on the stub's runtime so the server can answer it.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.local.block_on(&self.runtime, future)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        let handle = self.handle.clone();
        self.local.block_on(&self.runtime, async move {
            handle.stop(true).await;
        });
    }
}

async fn spawn(backend: StubBackend) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;
    let data = web::Data::new(backend);

    let server = HttpServer::new(move || {
        let api = web::scope("/api")
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/me", web::get().to(me))
            .route("/auth/logout", web::post().to(logout))
            .route("/quotes", web::get().to(quotes));
        App::new().app_data(data.clone()).service(api)
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    Ok((format!("http://{addr}/api"), handle))
}
