//! Two-tier route cache: an in-memory map mirrored into a durable store.
//!
//! Lookups consult memory first, then the durable store, promoting fresh
//! durable entries into memory. Entries expire once older than the TTL in
//! both tiers. The cache never fails: durable-store faults and corrupt
//! entries are reported through the [`RouteEventSink`] and otherwise treated
//! as misses, degrading the cache to memory-only.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{
    DurableStore, DurableStoreError, RouteCacheKey, RouteEvent, RouteEventSink, StoreOperation,
};
use crate::domain::{RouteResult, WaypointSequence};

mod entry;

use entry::CacheEntry;

/// Default freshness window for cached routes.
pub const DEFAULT_ROUTE_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default namespace prefix for durable store keys.
pub const DEFAULT_ROUTE_CACHE_PREFIX: &str = "route-cache:v1:";

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCacheConfig {
    /// Maximum entry age before eviction.
    pub ttl: Duration,
    /// Namespace prefix prepended to every durable store key.
    pub key_prefix: String,
}

impl Default for RouteCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_ROUTE_CACHE_TTL,
            key_prefix: DEFAULT_ROUTE_CACHE_PREFIX.to_owned(),
        }
    }
}

/// Counts reported by [`RouteCache::cleanup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    /// Expired entries dropped from memory.
    pub memory_evicted: usize,
    /// Expired entries removed from the durable store.
    pub durable_evicted: usize,
    /// Undecodable entries removed from the durable store.
    pub corrupt_removed: usize,
}

/// Counts reported by [`RouteCache::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitReport {
    /// Fresh durable entries loaded into memory.
    pub loaded: usize,
    /// Result of the cleanup sweep that follows loading.
    pub cleanup: CleanupReport,
}

/// Route cache component, constructed once per session and shared by `Arc`.
pub struct RouteCache {
    memory: Mutex<HashMap<RouteCacheKey, CacheEntry>>,
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn RouteEventSink>,
    ttl: TimeDelta,
    key_prefix: String,
}

impl RouteCache {
    /// Build an empty cache over `store`.
    ///
    /// Call [`RouteCache::init`] once afterwards to load entries persisted by
    /// earlier sessions.
    pub fn new(
        store: Arc<dyn DurableStore>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn RouteEventSink>,
        config: RouteCacheConfig,
    ) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            store,
            clock,
            events,
            ttl: TimeDelta::from_std(config.ttl).unwrap_or(TimeDelta::MAX),
            key_prefix: config.key_prefix,
        }
    }

    /// Look up the cached route for `waypoints`.
    ///
    /// ```rust,ignore
    /// if let Some(route) = cache.get(&waypoints).await {
    ///     draw(route);
    /// }
    /// ```
    pub async fn get(&self, waypoints: &WaypointSequence) -> Option<RouteResult> {
        self.get_by_key(&RouteCacheKey::for_waypoints(waypoints))
            .await
    }

    /// Store `route` for `waypoints` in both tiers, stamped with the current
    /// time. Durable write failures are reported and otherwise ignored.
    pub async fn set(&self, waypoints: &WaypointSequence, route: &RouteResult) {
        let key = RouteCacheKey::for_waypoints(waypoints);
        let entry = CacheEntry::new(route.clone(), self.clock.utc());
        let store_key = self.store_key(&key);

        match entry.encode() {
            Ok(raw) => {
                if let Err(error) = self.store.set(&store_key, &raw).await {
                    self.report_store_failure(StoreOperation::Write, Some(&store_key), &error);
                }
            }
            Err(message) => self.events.record(&RouteEvent::DurableStoreFailed {
                operation: StoreOperation::Write,
                store_key: Some(store_key),
                message,
            }),
        }

        self.lock_memory().insert(key, entry);
    }

    /// Evict every entry older than the TTL from both tiers, along with
    /// corrupt durable entries under this cache's namespace.
    pub async fn cleanup(&self) -> CleanupReport {
        let now = self.clock.utc();
        let memory_evicted = {
            let mut memory = self.lock_memory();
            let before = memory.len();
            memory.retain(|_, entry| !entry.is_expired(now, self.ttl));
            before - memory.len()
        };

        let mut report = CleanupReport {
            memory_evicted,
            ..CleanupReport::default()
        };
        for (store_key, decoded) in self.namespaced_entries().await {
            match decoded {
                Ok(entry) if entry.is_expired(now, self.ttl) => {
                    self.evict_expired(&store_key).await;
                    report.durable_evicted += 1;
                }
                Ok(_) => {}
                Err(message) => {
                    self.discard_corrupt(&store_key, message).await;
                    report.corrupt_removed += 1;
                }
            }
        }
        report
    }

    /// Load fresh durable entries into memory, then run [`RouteCache::cleanup`].
    ///
    /// Entries already in memory are kept as they are and not counted as
    /// loaded.
    pub async fn init(&self) -> InitReport {
        let now = self.clock.utc();
        let mut loaded = 0;

        for (store_key, decoded) in self.namespaced_entries().await {
            let Ok(entry) = decoded else {
                continue;
            };
            if entry.is_expired(now, self.ttl) {
                continue;
            }
            let suffix = store_key
                .strip_prefix(self.key_prefix.as_str())
                .unwrap_or_default();
            match RouteCacheKey::new(suffix) {
                Ok(key) => {
                    if let Entry::Vacant(slot) = self.lock_memory().entry(key) {
                        slot.insert(entry);
                        loaded += 1;
                    }
                }
                Err(error) => self.discard_corrupt(&store_key, error.to_string()).await,
            }
        }

        InitReport {
            loaded,
            cleanup: self.cleanup().await,
        }
    }

    /// Number of entries currently held in memory.
    pub fn memory_len(&self) -> usize {
        self.lock_memory().len()
    }

    /// Durable store key for `key`.
    pub fn store_key(&self, key: &RouteCacheKey) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn get_by_key(&self, key: &RouteCacheKey) -> Option<RouteResult> {
        let now = self.clock.utc();
        if let Some(route) = self.get_from_memory(key, now) {
            self.events.record(&RouteEvent::CacheHit {
                key: key.to_string(),
            });
            return Some(route);
        }

        let store_key = self.store_key(key);
        let route = match self.read_durable(&store_key).await {
            None => None,
            Some(Err(message)) => {
                self.discard_corrupt(&store_key, message).await;
                None
            }
            Some(Ok(entry)) if entry.is_expired(now, self.ttl) => {
                self.evict_expired(&store_key).await;
                None
            }
            Some(Ok(entry)) => {
                let route = entry.data.clone();
                self.lock_memory().insert(key.clone(), entry);
                Some(route)
            }
        };

        let event = if route.is_some() {
            RouteEvent::CacheHit {
                key: key.to_string(),
            }
        } else {
            RouteEvent::CacheMiss {
                key: key.to_string(),
            }
        };
        self.events.record(&event);
        route
    }

    /// Serve a fresh memory entry; drop a stale one so the durable tier decides.
    fn get_from_memory(&self, key: &RouteCacheKey, now: DateTime<Utc>) -> Option<RouteResult> {
        let mut memory = self.lock_memory();
        let fresh = memory
            .get(key)
            .map(|entry| !entry.is_expired(now, self.ttl))?;
        if fresh {
            memory.get(key).map(|entry| entry.data.clone())
        } else {
            memory.remove(key);
            None
        }
    }

    /// Read and decode one durable entry. `None` means absent or unreadable.
    async fn read_durable(&self, store_key: &str) -> Option<Result<CacheEntry, String>> {
        match self.store.get(store_key).await {
            Ok(raw) => raw.map(|raw| CacheEntry::decode(&raw)),
            Err(error) => {
                self.report_store_failure(StoreOperation::Read, Some(store_key), &error);
                None
            }
        }
    }

    /// Every durable entry under this cache's namespace, decoded.
    async fn namespaced_entries(&self) -> Vec<(String, Result<CacheEntry, String>)> {
        match self.store.entries_with_prefix(&self.key_prefix).await {
            Ok(entries) => entries
                .into_iter()
                .map(|(store_key, raw)| {
                    let decoded = CacheEntry::decode(&raw);
                    (store_key, decoded)
                })
                .collect(),
            Err(error) => {
                self.report_store_failure(StoreOperation::List, None, &error);
                Vec::new()
            }
        }
    }

    async fn evict_expired(&self, store_key: &str) {
        self.events.record(&RouteEvent::EntryExpired {
            key: store_key
                .strip_prefix(self.key_prefix.as_str())
                .unwrap_or(store_key)
                .to_owned(),
        });
        self.remove_durable(store_key).await;
    }

    async fn discard_corrupt(&self, store_key: &str, message: String) {
        self.events.record(&RouteEvent::CorruptEntryDiscarded {
            store_key: store_key.to_owned(),
            message,
        });
        self.remove_durable(store_key).await;
    }

    async fn remove_durable(&self, store_key: &str) {
        if let Err(error) = self.store.remove(store_key).await {
            self.report_store_failure(StoreOperation::Remove, Some(store_key), &error);
        }
    }

    fn report_store_failure(
        &self,
        operation: StoreOperation,
        store_key: Option<&str>,
        error: &DurableStoreError,
    ) {
        self.events.record(&RouteEvent::DurableStoreFailed {
            operation,
            store_key: store_key.map(str::to_owned),
            message: error.to_string(),
        });
    }

    fn lock_memory(&self) -> MutexGuard<'_, HashMap<RouteCacheKey, CacheEntry>> {
        // The map holds plain data, so a panic elsewhere cannot leave it torn.
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
