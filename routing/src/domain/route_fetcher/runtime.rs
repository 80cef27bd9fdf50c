//! Runtime dependency bundle for the resilient fetcher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ports::{DiscardRouteEvents, RouteEventSink};

use super::RetrySleeper;

/// Runtime helpers used by the retry loop.
pub struct RouteFetcherRuntime {
    /// Async sleep implementation used between attempts.
    pub sleeper: Arc<dyn RetrySleeper>,
    /// Sink receiving attempt and fallback events.
    pub events: Arc<dyn RouteEventSink>,
}

impl Default for RouteFetcherRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            events: Arc::new(DiscardRouteEvents),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
