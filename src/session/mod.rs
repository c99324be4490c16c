//! Token-pair storage.
//!
//! The access/refresh pair is the only shared mutable state in the client
//! pipeline. It is held behind the `SessionStore` trait and injected into
//! `ApiClient` explicitly, so tests can swap in an in-memory store.
//!
//! Both tokens live and die together: stored in one call, cleared in one
//! call, and both considered expired once the fixed wall-clock window from
//! the last store has passed. The window does not slide on reads.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }
}

pub trait SessionStore: Send + Sync {
    /// Persist a new pair, replacing any previous one.
    fn store(&self, pair: &TokenPair) -> anyhow::Result<()>;

    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String>;

    /// Remove both tokens unconditionally.
    fn clear(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    refresh_token: String,
    saved_at: DateTime<Utc>,
}

/// File-backed store under the CLI config directory, the process-local
/// equivalent of the browser portal's 7-day cookies.
pub struct FileSessionStore {
    dir: PathBuf,
    max_age: Duration,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf, max_age_days: i64) -> Self {
        Self { dir, max_age: Duration::days(max_age_days) }
    }

    pub fn from_config() -> anyhow::Result<Self> {
        Ok(Self::new(get_config_dir()?, config::config().session.max_age_days))
    }

    fn session_file(&self) -> PathBuf {
        self.dir.join("session.json")
    }

    fn load(&self) -> Option<StoredSession> {
        let file = self.session_file();
        let content = fs::read_to_string(&file).ok()?;
        let session: StoredSession = serde_json::from_str(&content).ok()?;

        if Utc::now() - session.saved_at > self.max_age {
            let _ = fs::remove_file(&file);
            return None;
        }

        Some(session)
    }
}

impl SessionStore for FileSessionStore {
    fn store(&self, pair: &TokenPair) -> anyhow::Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        let session = StoredSession {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            saved_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&session)?;
        fs::write(self.session_file(), content)?;
        Ok(())
    }

    fn access_token(&self) -> Option<String> {
        self.load().map(|s| s.access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.load().map(|s| s.refresh_token)
    }

    fn clear(&self) -> anyhow::Result<()> {
        let file = self.session_file();
        if file.exists() {
            fs::remove_file(file)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<TokenPair>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: TokenPair) -> Self {
        Self { inner: Mutex::new(Some(pair)) }
    }
}

impl SessionStore for MemorySessionStore {
    fn store(&self, pair: &TokenPair) -> anyhow::Result<()> {
        *self.inner.lock().expect("session lock poisoned") = Some(pair.clone());
        Ok(())
    }

    fn access_token(&self) -> Option<String> {
        self.inner.lock().expect("session lock poisoned").as_ref().map(|p| p.access_token.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.inner.lock().expect("session lock poisoned").as_ref().map(|p| p.refresh_token.clone())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.inner.lock().expect("session lock poisoned") = None;
        Ok(())
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("VOX_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("vox").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}
