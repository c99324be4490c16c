#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{OriginalUri, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum::body::Bytes;
use serde_json::{json, Value};

use vox_portal::proxy::{self, ProxyState};

/// Scripted stand-in for the backend API. Tracks per-endpoint call counts
/// so tests can assert exactly how many network calls a logical request
/// produced.
#[derive(Default)]
pub struct StubState {
    /// Access tokens the protected endpoints currently accept.
    pub valid_access: Mutex<HashSet<String>>,
    /// refresh_token -> next (access, refresh) pair.
    pub refresh_map: Mutex<HashMap<String, (String, String)>>,
    counters: Mutex<HashMap<String, usize>>,
}

impl StubState {
    pub fn allow_access(&self, token: &str) {
        self.valid_access.lock().unwrap().insert(token.to_string());
    }

    pub fn allow_refresh(&self, refresh: &str, next_access: &str, next_refresh: &str) {
        self.refresh_map
            .lock()
            .unwrap()
            .insert(refresh.to_string(), (next_access.to_string(), next_refresh.to_string()));
    }

    pub fn count(&self, key: &str) -> usize {
        *self.counters.lock().unwrap().get(key).unwrap_or(&0)
    }

    fn bump(&self, key: &str) {
        *self.counters.lock().unwrap().entry(key.to_string()).or_insert(0) += 1;
    }
}

pub struct Upstream {
    pub addr: SocketAddr,
    pub state: Arc<StubState>,
}

impl Upstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub async fn spawn_upstream() -> Upstream {
    let state = Arc::new(StubState::default());

    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/billing/wallet", get(wallet))
        .route("/teapot", get(teapot))
        .route("/badjson", get(badjson))
        .route("/html", get(html))
        .fallback(echo)
        .with_state(state.clone());

    let addr = serve(app).await;
    Upstream { addr, state }
}

/// Spawn the real proxy router pointed at the given upstream base.
pub async fn spawn_proxy(upstream_base: &str) -> SocketAddr {
    let app = proxy::router(ProxyState::new(upstream_base, Duration::from_secs(5)));
    serve(app).await
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("test listener has no local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    addr
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn unauthorized(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "success": false,
            "error": { "code": "UNAUTHORIZED", "message": message }
        })),
    )
}

async fn login(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> impl IntoResponse {
    state.bump("login");

    if body["password"] == json!("secret") {
        state.allow_access("a1");
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "access_token": "a1", "refresh_token": "r1" }
            })),
        )
    } else {
        unauthorized("invalid credentials")
    }
}

async fn refresh(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> impl IntoResponse {
    state.bump("refresh");

    let presented = body["refresh_token"].as_str().unwrap_or_default().to_string();
    let rotated = state.refresh_map.lock().unwrap().remove(&presented);

    match rotated {
        Some((access, refresh)) => {
            state.allow_access(&access);
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "data": { "access_token": access, "refresh_token": refresh }
                })),
            )
        }
        None => unauthorized("invalid refresh token"),
    }
}

async fn wallet(State(state): State<Arc<StubState>>, headers: HeaderMap) -> impl IntoResponse {
    state.bump("wallet");

    let authorized = bearer(&headers)
        .map(|token| state.valid_access.lock().unwrap().contains(&token))
        .unwrap_or(false);

    if authorized {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "balance_cents": 1200, "currency": "usd", "auto_recharge_enabled": false }
            })),
        )
    } else {
        unauthorized("access token expired")
    }
}

async fn teapot() -> impl IntoResponse {
    (StatusCode::IM_A_TEAPOT, Json(json!({ "success": true, "data": { "tea": true } })))
}

async fn badjson() -> impl IntoResponse {
    (StatusCode::OK, [(CONTENT_TYPE, "application/json")], "{not json")
}

async fn html() -> impl IntoResponse {
    (StatusCode::BAD_GATEWAY, [(CONTENT_TYPE, "text/html")], "<html>Error</html>")
}

/// Fallback: reflect the request back so tests can assert exactly what the
/// proxy forwarded.
async fn echo(
    State(state): State<Arc<StubState>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.bump("echo");

    let header_map: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();

    let body_json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    Json(json!({
        "success": true,
        "data": {
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "headers": header_map,
            "body": body_json,
        }
    }))
}
