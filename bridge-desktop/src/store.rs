//! State Persistence in a JSON File

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::StateStore,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// File-backed key-value store
///
/// Keeps every entry in memory and rewrites the whole backing file on each
/// change. The on-disk format is one JSON object mapping keys to string
/// values; the values are JSON documents the core serializes, and the store
/// never looks inside them.
///
/// Writes go through `tokio::fs`; reads are served from memory. The mutex is
/// never held across an await.
pub struct JsonFileStateStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStateStore {
    /// Open (or create) the store backed by `path`.
    ///
    /// A missing file starts empty. A corrupt file is reported and discarded:
    /// the store starts empty and the file is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(BridgeError::Io)?;
        }

        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "State file is corrupt, starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(BridgeError::Io(err)),
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened state store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Open the store at the platform data directory
    /// (`<data_dir>/resonance/state.json`).
    pub fn open_default() -> Result<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| BridgeError::NotAvailable("platform data directory".to_string()))?;
        Self::open(base.join("resonance").join("state.json"))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| BridgeError::OperationFailed("state store lock poisoned".to_string()))
    }

    fn serialize(map: &HashMap<String, String>) -> Result<String> {
        serde_json::to_string_pretty(map)
            .map_err(|e| BridgeError::OperationFailed(format!("State serialization failed: {e}")))
    }

    async fn flush(&self, serialized: String) -> Result<()> {
        tokio::fs::write(&self.path, serialized)
            .await
            .map_err(BridgeError::Io)
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let serialized = {
            let mut entries = self.entries()?;
            entries.insert(key.to_string(), value.to_string());
            Self::serialize(&entries)?
        };
        self.flush(serialized).await?;
        debug!(key, "Stored state entry");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let serialized = {
            let mut entries = self.entries()?;
            if entries.remove(key).is_none() {
                // Deleting a missing key is not an error and needs no write.
                return Ok(());
            }
            Self::serialize(&entries)?
        };
        self.flush(serialized).await?;
        debug!(key, "Removed state entry");
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_at(dir: &tempfile::TempDir) -> JsonFileStateStore {
        JsonFileStateStore::open(dir.path().join("state.json")).unwrap()
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = store_at(&dir);

        store.set("player.session", r#"{"tracks":[]}"#).await.unwrap();
        assert_eq!(
            store.get("player.session").await.unwrap(),
            Some(r#"{"tracks":[]}"#.to_string())
        );
        assert!(store.has_key("player.session").await.unwrap());
        assert!(!store.has_key("player.other").await.unwrap());
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = JsonFileStateStore::open(&path).unwrap();
            store.set("player.recents", "[1,2,3]").await.unwrap();
        }

        let reopened = JsonFileStateStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("player.recents").await.unwrap(),
            Some("[1,2,3]".to_string())
        );
    }

    #[tokio::test]
    async fn remove_deletes_and_tolerates_missing_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = store_at(&dir);

        store.remove("never.here").await.unwrap();

        store.set("a", "1").await.unwrap();
        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_keys_is_sorted() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = store_at(&dir);

        store.set("b", "2").await.unwrap();
        store.set("a", "1").await.unwrap();
        store.set("c", "3").await.unwrap();

        assert_eq!(store.list_keys().await.unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty_and_recovers_on_write() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not valid json").unwrap();

        let store = JsonFileStateStore::open(&path).unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());

        store.set("fresh", "start").await.unwrap();
        let reopened = JsonFileStateStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("fresh").await.unwrap(),
            Some("start".to_string())
        );
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("nested").join("state.json");

        let store = JsonFileStateStore::open(&nested).unwrap();
        store.set("k", "v").await.unwrap();
        assert!(nested.exists());
    }
}
