//! State Persistence Abstraction
//!
//! Provides a platform-agnostic key-value store for the core's serialized
//! snapshots (playback session, playlists, recents, caches). The shape follows
//! web `localStorage`: string keys, string values, no transactions. Every
//! value the core writes is a JSON document; the store never interprets them.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value persistence for serialized snapshots.
///
/// Platform mappings:
/// - Desktop: a JSON file or OS-specific preferences
/// - Embedded webview: `localStorage`
/// - Tests: an in-memory map
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::StateStore;
///
/// async fn save_snapshot(store: &dyn StateStore, json: &str) -> Result<()> {
///     store.set("resonance.session", json).await
/// }
/// ```
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Store a value under a key, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a value.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Delete a key.
    ///
    /// Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// List all stored keys.
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Check if a key exists without retrieving its value.
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SingleKeyStore;

    #[async_trait]
    impl StateStore for SingleKeyStore {
        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok((key == "present").then(|| "value".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }

        async fn list_keys(&self) -> Result<Vec<String>> {
            Ok(vec!["present".to_string()])
        }
    }

    #[tokio::test]
    async fn has_key_defaults_to_a_get_probe() {
        let store = SingleKeyStore;
        assert!(store.has_key("present").await.unwrap());
        assert!(!store.has_key("absent").await.unwrap());
    }
}
