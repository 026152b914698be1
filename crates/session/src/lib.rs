//! Persistent HTTP session store.
//!
//! A single JSON file (`sessions.json`) maps session id to session record.
//! Loaded once at startup (a missing or corrupt file degrades to an empty
//! store rather than failing), rewritten atomically on every mutation.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use courtrelay_core::RelayClock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Default session lifetime: 30 days.
pub const SESSION_LIFETIME: ChronoDuration = ChronoDuration::days(30);

const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to persist session store: {0}")]
    Persist(#[source] std::io::Error),
}

/// A single authenticated HTTP session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub device_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub user_agent: String,
    pub ip: String,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Persistent session store guarded by an `RwLock` over an in-memory map.
pub struct SessionStore {
    path: PathBuf,
    sessions: RwLock<HashMap<String, Session>>,
    clock: Arc<dyn RelayClock>,
}

impl SessionStore {
    /// Load (or initialize empty) the session store at `path`.
    pub fn load(path: impl Into<PathBuf>, clock: Arc<dyn RelayClock>) -> Self {
        let path = path.into();
        let sessions = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = sessions.len(), "session store loaded");
        Self {
            path,
            sessions: RwLock::new(sessions),
            clock,
        }
    }

    fn load_from_disk(path: &Path) -> HashMap<String, Session> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return HashMap::new(),
        };
        match serde_json::from_str(&content) {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "sessions.json is corrupt — starting empty");
                HashMap::new()
            }
        }
    }

    async fn persist(&self, sessions: &HashMap<String, Session>) {
        if let Err(e) = self.persist_inner(sessions) {
            warn!(error = %e, "failed to persist session store — in-memory state remains valid");
        }
    }

    fn persist_inner(&self, sessions: &HashMap<String, Session>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(SessionError::Persist)?;
        }
        let json = serde_json::to_string_pretty(sessions).map_err(|e| {
            SessionError::Persist(std::io::Error::other(e))
        })?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(SessionError::Persist)?;
        set_private_mode(&tmp_path);
        std::fs::rename(&tmp_path, &self.path).map_err(SessionError::Persist)?;
        Ok(())
    }

    /// Mint a new session for `user_agent`/`ip`, persist, and return it.
    pub async fn create(&self, user_agent: &str, ip: &str) -> Session {
        let now = self.clock.now_utc();
        let ip_prefix = courtrelay_core::id::ip_prefix(ip);
        let session = Session {
            id: courtrelay_core::id::new_session_id(),
            device_hash: courtrelay_core::id::device_fingerprint(user_agent, &ip_prefix),
            created_at: now,
            last_used: now,
            expires_at: now + SESSION_LIFETIME,
            user_agent: user_agent.to_string(),
            ip: ip.to_string(),
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        self.persist(&sessions).await;
        session
    }

    /// Look up a session, returning `None` if absent or expired.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let now = self.clock.now_utc();
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .filter(|s| !s.is_expired(now))
            .cloned()
    }

    /// Refresh `last_used` for a live session and persist.
    pub async fn touch(&self, id: &str) {
        let now = self.clock.now_utc();
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(id) else {
            return;
        };
        if session.is_expired(now) {
            return;
        }
        session.last_used = now;
        self.persist(&sessions).await;
    }

    /// Remove a session (idempotent).
    pub async fn delete(&self, id: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(id).is_some() {
            self.persist(&sessions).await;
        }
    }

    /// Drop every expired session; persists iff any were removed.
    /// Returns the number of sessions removed.
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now_utc();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        let removed = before - sessions.len();
        if removed > 0 {
            self.persist(&sessions).await;
        }
        removed
    }
}

#[cfg(unix)]
fn set_private_mode(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = std::fs::metadata(path) {
        let mut perms = metadata.permissions();
        perms.set_mode(0o600);
        let _ = std::fs::set_permissions(path, perms);
    }
}

#[cfg(not(unix))]
fn set_private_mode(_path: &Path) {}

/// Spawn the hourly expiry sweeper. Returns a handle the caller can abort.
pub fn spawn_sweeper(store: Arc<SessionStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = store.sweep().await;
            if removed > 0 {
                debug!(removed, "session sweeper evicted expired sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtrelay_core::FrozenClock;

    fn store_with_clock() -> (SessionStore, Arc<FrozenClock>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(FrozenClock::new(Utc::now()));
        let store = SessionStore::load(dir.path().join("sessions.json"), clock.clone());
        (store, clock, dir)
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let (store, _clock, _dir) = store_with_clock();
        let session = store.create("Mozilla/5.0", "10.0.0.1").await;
        let fetched = store.get(&session.id).await.unwrap();
        assert_eq!(fetched, session);
    }

    #[tokio::test]
    async fn get_absent_returns_none() {
        let (store, _clock, _dir) = store_with_clock();
        assert!(store.get("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn expired_session_is_absent() {
        let (store, clock, _dir) = store_with_clock();
        let session = store.create("ua", "1.2.3.4").await;
        clock.advance(SESSION_LIFETIME + ChronoDuration::seconds(1));
        assert!(store.get(&session.id).await.is_none());
    }

    #[tokio::test]
    async fn touch_updates_last_used() {
        let (store, clock, _dir) = store_with_clock();
        let session = store.create("ua", "1.2.3.4").await;
        clock.advance(ChronoDuration::hours(1));
        store.touch(&session.id).await;
        let fetched = store.get(&session.id).await.unwrap();
        assert!(fetched.last_used > session.last_used);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (store, _clock, _dir) = store_with_clock();
        let session = store.create("ua", "1.2.3.4").await;
        store.delete(&session.id).await;
        assert!(store.get(&session.id).await.is_none());
        store.delete(&session.id).await; // second delete: no-op, no panic
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let (store, clock, _dir) = store_with_clock();
        let drop_me = store.create("ua", "5.6.7.8").await;
        clock.advance(ChronoDuration::days(10));
        let keep = store.create("ua", "1.2.3.4").await;
        // `drop_me` expires at day 30, `keep` at day 40 — advance past the
        // first but not the second.
        clock.advance(ChronoDuration::days(21));
        let removed = store.sweep().await;
        assert_eq!(removed, 1);
        assert!(store.get(&drop_me.id).await.is_none());
        assert!(store.get(&keep.id).await.is_some());
    }

    #[tokio::test]
    async fn persists_across_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        let clock: Arc<dyn RelayClock> = Arc::new(FrozenClock::new(Utc::now()));
        let session = {
            let store = SessionStore::load(&path, clock.clone());
            store.create("ua", "1.2.3.4").await
        };

        let reloaded = SessionStore::load(&path, clock);
        let fetched = reloaded.get(&session.id).await.unwrap();
        assert_eq!(fetched, session);
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn RelayClock> = Arc::new(FrozenClock::new(Utc::now()));
        let store = SessionStore::load(dir.path().join("does-not-exist.json"), clock);
        assert!(store.get("anything").await.is_none());
    }

    #[tokio::test]
    async fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        std::fs::write(&path, "not json").unwrap();
        let clock: Arc<dyn RelayClock> = Arc::new(FrozenClock::new(Utc::now()));
        let store = SessionStore::load(&path, clock);
        assert!(store.get("anything").await.is_none());
    }
}
