use crate::versioned::{StoreError, VersionedDocument, VersionedStore};
use courtrelay_core::RelayClock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SANITIZE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', ' '];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(default)]
    pub scores: HashMap<String, Vec<i64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoutPayload {
    pub match_name: String,
    pub match_date: String,
    pub players: Vec<Player>,
}

/// Per-match player scouting data, with a one-shot archive-and-reset
/// operation.
pub struct ScoutStore {
    inner: VersionedStore<ScoutPayload>,
}

impl ScoutStore {
    pub fn load(path: impl Into<PathBuf>, clock: Arc<dyn RelayClock>) -> Self {
        Self {
            inner: VersionedStore::load(path, 0o644, clock),
        }
    }

    pub async fn get(&self) -> VersionedDocument<ScoutPayload> {
        self.inner.get().await
    }

    pub async fn get_version(&self) -> i64 {
        self.inner.get_version().await
    }

    pub async fn update(
        &self,
        payload: ScoutPayload,
    ) -> Result<VersionedDocument<ScoutPayload>, StoreError> {
        self.inner.update(payload).await
    }

    /// Snapshot the current document to `archive_dir` (skipped if
    /// `match_name` is empty), then reset to a fresh document dated today.
    pub async fn archive(&self, archive_dir: &Path) -> Result<(), StoreError> {
        let current = self.inner.get().await;
        if !current.payload.match_name.is_empty() {
            std::fs::create_dir_all(archive_dir).map_err(StoreError::Persist)?;
            let slug = sanitize(&current.payload.match_name);
            let filename = format!("{}_{}.json", current.payload.match_date, slug);
            let json = serde_json::to_string_pretty(&current)
                .map_err(|e| StoreError::Persist(std::io::Error::other(e)))?;
            std::fs::write(archive_dir.join(filename), json).map_err(StoreError::Persist)?;
        }

        let clock = self.inner.clock();
        let now = clock.now_utc();
        let fresh = VersionedDocument {
            version: 1,
            last_updated: now,
            payload: ScoutPayload {
                match_name: String::new(),
                match_date: now.date_naive().format("%Y-%m-%d").to_string(),
                players: Vec::new(),
            },
        };
        self.inner.replace(fresh).await
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if SANITIZE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtrelay_core::FrozenClock;
    use chrono::Utc;

    fn store() -> (ScoutStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn RelayClock> = Arc::new(FrozenClock::new(Utc::now()));
        (ScoutStore::load(dir.path().join("scout-current.json"), clock), dir)
    }

    #[test]
    fn sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize("A/B: C"), "A_B__C");
    }

    #[tokio::test]
    async fn archive_with_empty_match_name_skips_file_but_still_resets() {
        let (store, dir) = store();
        store.archive(&dir.path().join("archive")).await.unwrap();
        assert!(!dir.path().join("archive").exists());
        assert_eq!(store.get_version().await, 1);
    }

    #[tokio::test]
    async fn archive_writes_snapshot_and_resets_live_document() {
        let (store, dir) = store();
        store
            .update(ScoutPayload {
                match_name: "Final".into(),
                match_date: "2024-03-15".into(),
                players: vec![Player {
                    id: "p1".into(),
                    name: "Ada".into(),
                    number: Some(7),
                    scores: HashMap::new(),
                }],
            })
            .await
            .unwrap();

        let archive_dir = dir.path().join("archive");
        store.archive(&archive_dir).await.unwrap();

        let snapshot_path = archive_dir.join("2024-03-15_Final.json");
        assert!(snapshot_path.exists());
        let snapshot: VersionedDocument<ScoutPayload> =
            serde_json::from_str(&std::fs::read_to_string(snapshot_path).unwrap()).unwrap();
        assert_eq!(snapshot.payload.match_name, "Final");

        let fresh = store.get().await;
        assert_eq!(fresh.version, 1);
        assert_eq!(fresh.payload.match_name, "");
        assert!(fresh.payload.players.is_empty());
    }
}
