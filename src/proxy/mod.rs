//! Generic reverse proxy.
//!
//! Accepts any verb at `/api/proxy/*path`, forwards it to the configured
//! upstream with a strict header allow-list, and replays the upstream's
//! response at the upstream's own status code. Malformed or non-JSON
//! upstream bodies are converted into the canonical error envelope instead
//! of crashing the handler; nothing escapes unshaped. Stateless, no
//! retries - recovery from expired tokens belongs to the client, one layer
//! up.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::any;
use axum::Router;
use serde_json::Value;

use crate::config;
use crate::error::ApiError;

#[derive(Clone)]
pub struct ProxyState {
    upstream_base: String,
    http: reqwest::Client,
}

impl ProxyState {
    pub fn new(upstream_base: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { upstream_base: upstream_base.trim_end_matches('/').to_string(), http }
    }

    pub fn from_config() -> Self {
        let cfg = config::config();
        Self::new(&cfg.proxy.upstream_base_url, Duration::from_secs(cfg.proxy.request_timeout_secs))
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/api/proxy", any(forward_root))
        .route("/api/proxy/*path", any(forward))
        .with_state(state)
}

async fn forward(
    State(state): State<ProxyState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward_inner(state, method, path, query, headers, body).await
}

async fn forward_root(
    State(state): State<ProxyState>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward_inner(state, method, String::new(), query, headers, body).await
}

async fn forward_inner(
    state: ProxyState,
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Preflight never reaches the upstream
    if method == Method::OPTIONS {
        return with_cors(StatusCode::OK.into_response());
    }

    match forward_upstream(&state, method, &path, query, &headers, &body).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!("proxy failure: {err}");
            with_cors(ApiError::proxy(err.to_string()).into_response())
        }
    }
}

async fn forward_upstream(
    state: &ProxyState,
    method: Method,
    path: &str,
    query: Option<String>,
    headers: &HeaderMap,
    body: &Bytes,
) -> anyhow::Result<Response> {
    let mut url = state.upstream_base.clone();
    if !path.is_empty() {
        url.push('/');
        url.push_str(path);
    }
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(&query);
    }

    tracing::debug!(%method, %url, "forwarding to upstream");

    // Deliberate allow-list: only Content-Type and an inbound Authorization
    // header make it upstream. Cookies and custom headers do not.
    let mut request = state
        .http
        .request(method.clone(), &url)
        .header(CONTENT_TYPE, "application/json");

    if let Some(auth) = headers.get(AUTHORIZATION) {
        request = request.header(AUTHORIZATION, auth.clone());
    }

    if matches!(method, Method::POST | Method::PUT | Method::PATCH) {
        // A body that fails to parse as JSON is dropped, not an error; the
        // request still forwards without one.
        if let Ok(value) = serde_json::from_slice::<Value>(body) {
            request = request.json(&value);
        }
    }

    let upstream = request.send().await?;
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let is_json = upstream
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);
    let text = upstream.text().await?;

    let response = if is_json {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => (status, Json(value)).into_response(),
            Err(_) => ApiError::upstream_parse(status.as_u16(), text).into_response(),
        }
    } else {
        ApiError::upstream_not_json(status.as_u16(), text).into_response()
    };

    Ok(with_cors(response))
}

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, PUT, DELETE, PATCH, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}
