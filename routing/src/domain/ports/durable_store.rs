//! Port abstraction for the durable key/value store behind the route cache.
//!
//! The store holds plain strings under namespaced keys and survives process
//! restarts. Capacity is finite, so writes may fail under quota pressure; the
//! route cache absorbs every failure reported here.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by durable store adapters.
    pub enum DurableStoreError {
        /// Store could not be reached or opened.
        Unavailable { message: String } => "durable store unavailable: {message}",
        /// Writing would exceed the store capacity.
        QuotaExceeded { message: String } => "durable store quota exceeded: {message}",
        /// Reading or writing the backing medium failed.
        Io { message: String } => "durable store i/o failed: {message}",
    }
}

/// Namespaced string key/value store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, DurableStoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), DurableStoreError>;

    /// Remove `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), DurableStoreError>;

    /// Enumerate every stored key, across all namespaces.
    async fn keys(&self) -> Result<Vec<String>, DurableStoreError>;

    /// Read every entry whose key starts with `prefix`.
    ///
    /// The default lists keys and reads them one by one. Adapters that load
    /// the whole store per call override it with a single read.
    async fn entries_with_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, DurableStoreError> {
        let mut entries = Vec::new();
        for key in self.keys().await? {
            if !key.starts_with(prefix) {
                continue;
            }
            if let Some(value) = self.get(&key).await? {
                entries.push((key, value));
            }
        }
        Ok(entries)
    }
}
