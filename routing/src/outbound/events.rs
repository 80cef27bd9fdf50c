//! Tracing-backed route event sink.

use tracing::{debug, error, warn};

use crate::domain::ports::{RouteEvent, RouteEventSink};

/// Writes every route event to `tracing` at its severity, with the event
/// fields as structured data.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRouteEventSink;

impl RouteEventSink for TracingRouteEventSink {
    fn record(&self, event: &RouteEvent) {
        let kind = event.kind();
        match event {
            RouteEvent::CacheHit { key } => debug!(kind, %key, "route cache hit"),
            RouteEvent::CacheMiss { key } => debug!(kind, %key, "route cache miss"),
            RouteEvent::EntryExpired { key } => debug!(kind, %key, "route cache entry expired"),
            RouteEvent::CorruptEntryDiscarded { store_key, message } => warn!(
                kind,
                %store_key,
                error = %message,
                "discarded undecodable route cache entry"
            ),
            RouteEvent::DurableStoreFailed {
                operation,
                store_key,
                message,
            } => warn!(
                kind,
                %operation,
                store_key = store_key.as_deref().unwrap_or_default(),
                error = %message,
                "durable store call failed; continuing with memory cache"
            ),
            RouteEvent::AttemptFailed {
                key,
                attempt,
                max_attempts,
                message,
            } => warn!(
                kind,
                %key,
                attempt,
                max_attempts,
                error = %message,
                "routing attempt failed"
            ),
            RouteEvent::FallbackSynthesised {
                key,
                attempts,
                message,
            } => error!(
                kind,
                %key,
                attempts,
                error = %message,
                "routing failed; using straight-line fallback route"
            ),
        }
    }
}
