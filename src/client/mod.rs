//! Authenticated HTTP client.
//!
//! Centralizes outbound API calls: attaches the stored bearer token,
//! normalizes every response into the canonical envelope, and transparently
//! recovers from exactly one class of failure - an expired access token -
//! with a single refresh-and-retry cycle. Everything else propagates to the
//! caller unchanged.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::config::{self, AppConfig};
use crate::envelope::Envelope;
use crate::session::{SessionStore, TokenPair};

/// The one path that must never trigger its own refresh cycle.
pub const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach the backend: {0}")]
    Transport(#[from] reqwest::Error),

    /// Tokens are cleared before this is returned; the caller must send the
    /// user back through login.
    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("{code}: {message}")]
    Backend { status: u16, code: String, message: String },

    #[error("invalid response from backend: {0}")]
    InvalidResponse(String),
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    // Serializes concurrent refresh attempts; see refresh_session
    refresh_gate: tokio::sync::Mutex<()>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, store, config::config().client.request_timeout_secs)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        store: Arc<dyn SessionStore>,
        timeout_secs: u64,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            refresh_gate: tokio::sync::Mutex::new(()),
        })
    }

    pub fn from_config(store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        Self::new(resolve_base_url(config::config()), store)
    }

    pub fn session(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request, recovering from an expired access token at most once.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Envelope, ClientError> {
        let token = self.store.access_token();
        let response = self.send(method.clone(), path, query, body, token.clone()).await?;

        // Refresh only when an access token was actually sent and rejected;
        // a 401 on an unauthenticated call (bad login) is just an error.
        if response.status() == StatusCode::UNAUTHORIZED && token.is_some() && path != REFRESH_PATH
        {
            self.refresh_after(token).await?;
            // The retry must carry the freshly stored token, never the stale
            // one, and happens exactly once for this logical request.
            let retry = self
                .send(method, path, query, body, self.store.access_token())
                .await?;
            return Self::finish(retry).await;
        }

        Self::finish(response).await
    }

    pub async fn get(&self, path: &str) -> Result<Envelope, ClientError> {
        self.request(Method::GET, path, &[], None).await
    }

    pub async fn get_with(&self, path: &str, query: &[(&str, String)]) -> Result<Envelope, ClientError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Envelope, ClientError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Envelope, ClientError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Envelope, ClientError> {
        self.request(Method::DELETE, path, &[], None).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        token: Option<String>,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        Ok(request.send().await?)
    }

    /// Exchange the refresh token for a new pair and store it.
    ///
    /// Concurrent expirations coalesce here: one caller performs the
    /// exchange while the rest wait on the gate, then observe the rotated
    /// pair and skip their own exchange. Any failure clears both tokens,
    /// the equivalent of the portal's hard redirect to login.
    pub async fn refresh_session(&self) -> Result<(), ClientError> {
        self.refresh_after(self.store.access_token()).await
    }

    /// `stale` is the access token the failing request was sent with. If the
    /// stored token differs by the time we hold the gate, a sibling already
    /// rotated the pair and no second exchange is needed.
    async fn refresh_after(&self, stale: Option<String>) -> Result<(), ClientError> {
        let _guard = self.refresh_gate.lock().await;

        let current = self.store.access_token();
        if current != stale {
            return match current {
                Some(_) => Ok(()),
                None => Err(ClientError::SessionExpired),
            };
        }

        let Some(refresh_token) = self.store.refresh_token() else {
            let _ = self.store.clear();
            return Err(ClientError::SessionExpired);
        };

        let body = json!({ "refresh_token": refresh_token });
        let response = match self.send(Method::POST, REFRESH_PATH, &[], Some(&body), None).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("token refresh failed in transit: {err}");
                let _ = self.store.clear();
                return Err(ClientError::SessionExpired);
            }
        };

        let envelope = match Self::finish(response).await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!("token refresh rejected: {err}");
                let _ = self.store.clear();
                return Err(ClientError::SessionExpired);
            }
        };

        let pair: TokenPair = serde_json::from_value(envelope.data).map_err(|err| {
            tracing::warn!("token refresh returned an unusable payload: {err}");
            let _ = self.store.clear();
            ClientError::SessionExpired
        })?;

        self.store.store(&pair).map_err(|err| {
            tracing::error!("failed to persist refreshed tokens: {err}");
            ClientError::SessionExpired
        })?;

        tracing::debug!("access token refreshed");
        Ok(())
    }

    /// Read the body, normalize it into the canonical envelope, and map
    /// unsuccessful envelopes onto the client error taxonomy.
    async fn finish(response: reqwest::Response) -> Result<Envelope, ClientError> {
        let status = response.status();
        let text = response.text().await?;

        let value: Value = serde_json::from_str(&text)
            .map_err(|_| ClientError::InvalidResponse(truncate(&text)))?;

        let envelope = Envelope::normalize(value);
        if !envelope.success {
            let (code, message) = envelope
                .error
                .map(|e| (e.code, e.message))
                .unwrap_or_else(|| {
                    ("UNKNOWN".to_string(), format!("request failed with status {}", status))
                });
            return Err(ClientError::Backend { status: status.as_u16(), code, message });
        }

        Ok(envelope)
    }
}

/// Pick the backend base the way the portal does: loopback deployments go
/// through the local reverse proxy, everything else talks to the configured
/// absolute backend URL directly.
pub fn resolve_base_url(config: &AppConfig) -> String {
    let public = config.client.public_base_url.trim_end_matches('/');

    let is_loopback = Url::parse(public)
        .ok()
        .and_then(|url| url.host_str().map(|h| h == "localhost" || h == "127.0.0.1" || h == "::1"))
        .unwrap_or(false);

    if is_loopback {
        format!("http://127.0.0.1:{}/api/proxy", config.client.proxy_port)
    } else {
        public.to_string()
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.len() > MAX {
        let mut end = MAX;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn dev_config(public: &str) -> AppConfig {
        let mut config = AppConfig::from_env();
        config.client.public_base_url = public.to_string();
        config.client.proxy_port = 4000;
        config
    }

    #[test]
    fn loopback_base_routes_through_proxy() {
        let config = dev_config("http://localhost:8080");
        assert_eq!(resolve_base_url(&config), "http://127.0.0.1:4000/api/proxy");

        let config = dev_config("http://127.0.0.1:9000/");
        assert_eq!(resolve_base_url(&config), "http://127.0.0.1:4000/api/proxy");
    }

    #[test]
    fn public_base_is_used_directly() {
        let config = dev_config("https://api.vox.example/");
        assert_eq!(resolve_base_url(&config), "https://api.vox.example");
    }

    #[test]
    fn truncate_caps_long_bodies() {
        let long = "x".repeat(500);
        let out = truncate(&long);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }
}
