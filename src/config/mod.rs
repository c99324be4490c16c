use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub proxy: ProxyConfig,
    pub client: ClientConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Server-side settings for the reverse proxy binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Upstream backend base URL, no trailing slash.
    pub upstream_base_url: String,
    pub request_timeout_secs: u64,
    pub health_timeout_secs: u64,
    pub enable_request_logging: bool,
}

/// Client-side settings for the authenticated API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Direct backend base URL used when not running against a loopback host.
    pub public_base_url: String,
    /// Port the local reverse proxy listens on.
    pub proxy_port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Wall-clock lifetime of a stored token pair, counted from the last
    /// store, never renewed on access.
    pub max_age_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Proxy overrides
        if let Ok(v) = env::var("API_BASE_URL") {
            self.proxy.upstream_base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("VOX_PROXY_TIMEOUT_SECS") {
            self.proxy.request_timeout_secs = v.parse().unwrap_or(self.proxy.request_timeout_secs);
        }
        if let Ok(v) = env::var("VOX_HEALTH_TIMEOUT_SECS") {
            self.proxy.health_timeout_secs = v.parse().unwrap_or(self.proxy.health_timeout_secs);
        }
        if let Ok(v) = env::var("VOX_ENABLE_REQUEST_LOGGING") {
            self.proxy.enable_request_logging = v.parse().unwrap_or(self.proxy.enable_request_logging);
        }

        // Client overrides
        if let Ok(v) = env::var("VOX_PUBLIC_API_BASE_URL") {
            self.client.public_base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("VOX_PROXY_PORT") {
            self.client.proxy_port = v.parse().unwrap_or(self.client.proxy_port);
        }
        if let Ok(v) = env::var("VOX_CLIENT_TIMEOUT_SECS") {
            self.client.request_timeout_secs = v.parse().unwrap_or(self.client.request_timeout_secs);
        }

        // Session overrides
        if let Ok(v) = env::var("VOX_SESSION_MAX_AGE_DAYS") {
            self.session.max_age_days = v.parse().unwrap_or(self.session.max_age_days);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            proxy: ProxyConfig {
                upstream_base_url: "http://127.0.0.1:8080".to_string(),
                request_timeout_secs: 30,
                health_timeout_secs: 5,
                enable_request_logging: true,
            },
            client: ClientConfig {
                public_base_url: "http://127.0.0.1:8080".to_string(),
                proxy_port: 4000,
                request_timeout_secs: 30,
            },
            session: SessionConfig { max_age_days: 7 },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            proxy: ProxyConfig {
                upstream_base_url: "https://api.staging.vox.example".to_string(),
                request_timeout_secs: 20,
                health_timeout_secs: 5,
                enable_request_logging: true,
            },
            client: ClientConfig {
                public_base_url: "https://api.staging.vox.example".to_string(),
                proxy_port: 4000,
                request_timeout_secs: 20,
            },
            session: SessionConfig { max_age_days: 7 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            proxy: ProxyConfig {
                upstream_base_url: "https://api.vox.example".to_string(),
                request_timeout_secs: 15,
                health_timeout_secs: 3,
                enable_request_logging: false,
            },
            client: ClientConfig {
                public_base_url: "https://api.vox.example".to_string(),
                proxy_port: 4000,
                request_timeout_secs: 15,
            },
            session: SessionConfig { max_age_days: 7 },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
