//! Process-local durable store.
//!
//! Nothing survives a restart, which makes this adapter the memory-only
//! configuration of the route cache and the default store in tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::entry_size;
use crate::domain::ports::{DurableStore, DurableStoreError};

/// `BTreeMap`-backed store with an optional total byte quota.
#[derive(Debug, Default)]
pub struct InMemoryDurableStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl InMemoryDurableStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once keys and values together would
    /// exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Insert a raw value, bypassing the quota. Used to seed fixtures.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    /// Read a raw value without going through the port.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DurableStore for InMemoryDurableStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DurableStoreError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DurableStoreError> {
        let mut entries = self.lock();
        if let Some(quota) = self.quota_bytes {
            let used = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| entry_size(existing, stored))
                .sum::<usize>();
            let needed = used.saturating_add(entry_size(key, value));
            if needed > quota {
                return Err(DurableStoreError::quota_exceeded(format!(
                    "writing {key} needs {needed} bytes, quota is {quota}"
                )));
            }
        }
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), DurableStoreError> {
        self.lock().remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, DurableStoreError> {
        Ok(self.lock().keys().cloned().collect())
    }

    async fn entries_with_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, DurableStoreError> {
        Ok(self
            .lock()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn set_then_get_returns_value() {
        let store = InMemoryDurableStore::new();
        store.set("route-cache:v1:a", "payload").await.expect("set");
        assert_eq!(
            store.get("route-cache:v1:a").await.expect("get"),
            Some("payload".to_owned())
        );
        assert_eq!(store.keys().await.expect("keys"), vec!["route-cache:v1:a"]);
    }

    #[rstest]
    #[tokio::test]
    async fn remove_of_missing_key_succeeds() {
        let store = InMemoryDurableStore::new();
        store.remove("absent").await.expect("remove");
        assert!(store.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn quota_rejects_oversized_writes_and_keeps_existing_data() {
        let store = InMemoryDurableStore::with_quota(16);
        store.set("a", "0123456789").await.expect("fits");

        let err = store
            .set("b", "0123456789")
            .await
            .expect_err("exceeds quota");
        assert!(matches!(err, DurableStoreError::QuotaExceeded { .. }));
        assert_eq!(store.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn overwriting_a_key_does_not_double_count_it() {
        let store = InMemoryDurableStore::with_quota(12);
        store.set("a", "0123456789").await.expect("fits");
        store.set("a", "9876543210").await.expect("replacement fits");
        assert_eq!(store.raw("a"), Some("9876543210".to_owned()));
    }

    #[rstest]
    #[tokio::test]
    async fn entries_with_prefix_skips_other_namespaces() {
        let store = InMemoryDurableStore::new();
        store.insert_raw("route-cache:v1:a", "1");
        store.insert_raw("preferences:theme", "dark");

        let entries = store
            .entries_with_prefix("route-cache:v1:")
            .await
            .expect("entries");
        assert_eq!(entries, vec![("route-cache:v1:a".to_owned(), "1".to_owned())]);
    }
}
