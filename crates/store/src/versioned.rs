use chrono::{DateTime, Utc};
use courtrelay_core::RelayClock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to persist document: {0}")]
    Persist(#[source] std::io::Error),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),
}

/// A document wrapped with its monotonic version and last-write timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedDocument<T> {
    pub version: i64,
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: T,
}

/// Generic versioned JSON document store, backed by a single file.
///
/// Loaded once at startup; a missing or corrupt file falls back to a fresh
/// default document rather than failing. Every mutation rewrites the file
/// atomically (write to a temp path, then rename).
pub struct VersionedStore<T> {
    path: PathBuf,
    mode: u32,
    doc: RwLock<VersionedDocument<T>>,
    clock: Arc<dyn RelayClock>,
}

impl<T> VersionedStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static,
{
    pub fn load(path: impl Into<PathBuf>, mode: u32, clock: Arc<dyn RelayClock>) -> Self {
        let path = path.into();
        let doc = Self::load_from_disk(&path).unwrap_or_else(|| {
            debug!(path = %path.display(), "no usable document on disk — starting fresh");
            fresh_document(clock.as_ref())
        });
        Self {
            path,
            mode,
            doc: RwLock::new(doc),
            clock,
        }
    }

    fn load_from_disk(path: &Path) -> Option<VersionedDocument<T>> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "document is corrupt — starting fresh");
                None
            }
        }
    }

    fn persist_inner(&self, doc: &VersionedDocument<T>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::Persist)?;
        }
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| StoreError::Persist(std::io::Error::other(e)))?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(StoreError::Persist)?;
        set_mode(&tmp_path, self.mode);
        std::fs::rename(&tmp_path, &self.path).map_err(StoreError::Persist)?;
        Ok(())
    }

    /// Snapshot copy of the current document.
    pub async fn get(&self) -> VersionedDocument<T> {
        self.doc.read().await.clone()
    }

    pub async fn get_version(&self) -> i64 {
        self.doc.read().await.version
    }

    /// Stamp `payload` with `previous.version + 1` and `now`, persist, and
    /// return the stored document. The caller's own version (if it set one
    /// via a round-tripped struct) is ignored.
    ///
    /// The in-memory document is updated before persisting: on a persist
    /// failure the mutation already happened (single-writer, last-writer-wins
    /// semantics — the 500 reported to the caller does not roll it back).
    pub async fn update(&self, payload: T) -> Result<VersionedDocument<T>, StoreError> {
        let mut doc = self.doc.write().await;
        let updated = VersionedDocument {
            version: doc.version + 1,
            last_updated: self.clock.now_utc(),
            payload,
        };
        *doc = updated.clone();
        self.persist_inner(&updated)?;
        Ok(updated)
    }

    /// Replace the document outright (used by `archive`'s reset step) and
    /// persist. Does not bump the version — the caller supplies the full
    /// document, including its version.
    pub(crate) async fn replace(&self, doc: VersionedDocument<T>) -> Result<(), StoreError> {
        let mut guard = self.doc.write().await;
        *guard = doc.clone();
        self.persist_inner(&doc)?;
        Ok(())
    }

    pub(crate) fn clock(&self) -> &Arc<dyn RelayClock> {
        &self.clock
    }
}

fn fresh_document<T: Default>(clock: &dyn RelayClock) -> VersionedDocument<T> {
    VersionedDocument {
        version: 1,
        last_updated: clock.now_utc(),
        payload: T::default(),
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = std::fs::metadata(path) {
        let mut perms = metadata.permissions();
        perms.set_mode(mode);
        let _ = std::fs::set_permissions(path, perms);
    }
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}
