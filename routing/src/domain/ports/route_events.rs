//! Port for structured route-layer observability events.
//!
//! Nothing in the route layer reports failures through its return values:
//! durable-store faults and routing failures surface only as events here, so
//! the map stays renderable while operators can still see what degraded.

use std::fmt;

/// Severity attached to each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventSeverity {
    /// Routine cache activity.
    Debug,
    /// Degraded but handled.
    Warn,
    /// Terminal degradation visible to users.
    Error,
}

/// Durable store operation named in failure events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Reading one key.
    Read,
    /// Writing one key.
    Write,
    /// Removing one key.
    Remove,
    /// Enumerating keys.
    List,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Remove => "remove",
            Self::List => "list",
        };
        f.write_str(label)
    }
}

/// One observability record emitted by the route cache or fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteEvent {
    /// A lookup was served from memory or the durable store.
    CacheHit {
        /// Route request key.
        key: String,
    },
    /// A lookup found nothing usable.
    CacheMiss {
        /// Route request key.
        key: String,
    },
    /// An entry outlived the TTL and was evicted.
    EntryExpired {
        /// Route request key.
        key: String,
    },
    /// A durable entry could not be decoded and was discarded.
    CorruptEntryDiscarded {
        /// Durable store key, including namespace prefix.
        store_key: String,
        /// Decoder message.
        message: String,
    },
    /// A durable store call failed; the cache carried on without it.
    DurableStoreFailed {
        /// Operation that failed.
        operation: StoreOperation,
        /// Durable store key, when the operation targets one.
        store_key: Option<String>,
        /// Adapter message.
        message: String,
    },
    /// One routing attempt failed.
    AttemptFailed {
        /// Route request key.
        key: String,
        /// One-based attempt number.
        attempt: u32,
        /// Configured attempt bound.
        max_attempts: u32,
        /// Failure description.
        message: String,
    },
    /// Every attempt failed and a straight-line route was returned instead.
    FallbackSynthesised {
        /// Route request key.
        key: String,
        /// Attempts made before giving up.
        attempts: u32,
        /// Description of the final failure.
        message: String,
    },
}

impl RouteEvent {
    /// Severity used when logging the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            Self::CacheHit { .. } | Self::CacheMiss { .. } | Self::EntryExpired { .. } => {
                EventSeverity::Debug
            }
            Self::CorruptEntryDiscarded { .. }
            | Self::DurableStoreFailed { .. }
            | Self::AttemptFailed { .. } => EventSeverity::Warn,
            Self::FallbackSynthesised { .. } => EventSeverity::Error,
        }
    }

    /// Stable machine-readable event name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CacheHit { .. } => "cache_hit",
            Self::CacheMiss { .. } => "cache_miss",
            Self::EntryExpired { .. } => "entry_expired",
            Self::CorruptEntryDiscarded { .. } => "corrupt_entry_discarded",
            Self::DurableStoreFailed { .. } => "durable_store_failed",
            Self::AttemptFailed { .. } => "attempt_failed",
            Self::FallbackSynthesised { .. } => "fallback_synthesised",
        }
    }
}

/// Sink receiving route events.
#[cfg_attr(test, mockall::automock)]
pub trait RouteEventSink: Send + Sync {
    /// Record one event. Sinks must not fail or block.
    fn record(&self, event: &RouteEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardRouteEvents;

impl RouteEventSink for DiscardRouteEvents {
    fn record(&self, _event: &RouteEvent) {}
}
