//! Session-scoped key/value storage with idle expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::Result;

/// Default idle timeout after which a session is discarded.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Opaque identifier of a browser session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing session token (e.g. from a cookie).
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// String values keyed per session.
///
/// Expiry policy belongs to the implementation; callers only see a value
/// disappear once its session has been idle too long.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session: &SessionId, key: &str) -> Result<Option<String>>;

    async fn set(&self, session: &SessionId, key: &str, value: String) -> Result<()>;

    async fn remove(&self, session: &SessionId, key: &str) -> Result<()>;
}

#[derive(Debug)]
struct SessionEntry {
    values: HashMap<String, String>,
    last_seen: Instant,
}

/// In-memory session store. Sessions idle longer than the timeout are dropped.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    idle_timeout: Duration,
}

impl InMemorySessionStore {
    /// Creates a store with the default 30 minute idle timeout.
    pub fn new() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Returns the number of sessions that have not gone idle.
    pub async fn session_count(&self) -> usize {
        let timeout = self.idle_timeout;
        self.sessions
            .read()
            .await
            .values()
            .filter(|entry| entry.last_seen.elapsed() < timeout)
            .count()
    }

    /// Drops every idle session. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let timeout = self.idle_timeout;
        sessions.retain(|_, entry| entry.last_seen.elapsed() < timeout);
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::debug!(purged, "purged idle sessions");
        }
        purged
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session: &SessionId, key: &str) -> Result<Option<String>> {
        let mut sessions = self.sessions.write().await;
        let Some(entry) = sessions.get_mut(session) else {
            return Ok(None);
        };

        if entry.last_seen.elapsed() >= self.idle_timeout {
            sessions.remove(session);
            return Ok(None);
        }

        entry.last_seen = Instant::now();
        Ok(entry.values.get(key).cloned())
    }

    async fn set(&self, session: &SessionId, key: &str, value: String) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(session) {
            // New visitors sweep out abandoned sessions.
            let timeout = self.idle_timeout;
            sessions.retain(|_, entry| entry.last_seen.elapsed() < timeout);
        }

        let now = Instant::now();
        let entry = sessions
            .entry(session.clone())
            .or_insert_with(|| SessionEntry {
                values: HashMap::new(),
                last_seen: now,
            });

        if entry.last_seen.elapsed() >= self.idle_timeout {
            entry.values.clear();
        }
        entry.last_seen = now;
        entry.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, session: &SessionId, key: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(session) {
            entry.values.remove(key);
            entry.last_seen = Instant::now();
        }
        Ok(())
    }
}
