//! Resilient route fetching: cache first, bounded retries, then a
//! straight-line fallback.
//!
//! [`ResilientRouteFetcher::fetch_route`] never fails. Every failed attempt
//! is reported as a [`RouteEvent::AttemptFailed`]; once the attempt bound is
//! exhausted the fetcher reports [`RouteEvent::FallbackSynthesised`] and
//! returns a synthesised route that is never cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ports::{RouteCacheKey, RouteEvent, RouteEventSink, RouteSource};
use crate::domain::{
    FALLBACK_SPEED_M_PER_H, RouteCache, RouteResult, WaypointSequence, synthesise_fallback_route,
};

mod runtime;

pub use runtime::{RouteFetcherRuntime, TokioSleeper};

/// Fetcher configuration controlling the retry loop and fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteFetcherConfig {
    /// Maximum source calls per request, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Time limit for a single source call.
    pub attempt_timeout: Duration,
    /// Average speed assumed by fallback routes, in metres per hour.
    pub fallback_speed_m_per_h: f64,
}

impl Default for RouteFetcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            retry_delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(10),
            fallback_speed_m_per_h: FALLBACK_SPEED_M_PER_H,
        }
    }
}

/// Async clock-independent sleeping abstraction for retries.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    ///
    /// ```rust,no_run
    /// use async_trait::async_trait;
    /// use itinerary_routing::domain::RetrySleeper;
    /// use std::sync::{Arc, Mutex};
    /// use std::time::Duration;
    /// #[derive(Default)]
    /// struct CountingSleeper {
    ///     calls: Arc<Mutex<u32>>,
    /// }
    /// #[async_trait]
    /// impl RetrySleeper for CountingSleeper {
    ///     async fn sleep(&self, _duration: Duration) {
    ///         *self.calls.lock().expect("calls mutex") += 1;
    ///     }
    /// }
    /// # async fn demo() {
    /// let sleeper = CountingSleeper::default();
    /// sleeper.sleep(Duration::from_millis(25)).await;
    /// assert_eq!(*sleeper.calls.lock().expect("calls mutex"), 1);
    /// # }
    /// ```
    async fn sleep(&self, duration: Duration);
}

/// Cache-backed route fetcher with bounded retries and a local fallback.
pub struct ResilientRouteFetcher {
    cache: Arc<RouteCache>,
    sleeper: Arc<dyn RetrySleeper>,
    events: Arc<dyn RouteEventSink>,
    config: RouteFetcherConfig,
}

impl ResilientRouteFetcher {
    /// Build a fetcher that sleeps on Tokio and discards events.
    /// ```rust,ignore
    /// let fetcher = ResilientRouteFetcher::new(cache, RouteFetcherConfig::default());
    /// ```
    pub fn new(cache: Arc<RouteCache>, config: RouteFetcherConfig) -> Self {
        Self::with_runtime(cache, RouteFetcherRuntime::default(), config)
    }

    /// Build a fetcher with injected runtime abstractions.
    /// ```rust,ignore
    /// let fetcher = ResilientRouteFetcher::with_runtime(cache, runtime, config);
    /// ```
    pub fn with_runtime(
        cache: Arc<RouteCache>,
        runtime: RouteFetcherRuntime,
        config: RouteFetcherConfig,
    ) -> Self {
        Self {
            cache,
            sleeper: runtime.sleeper,
            events: runtime.events,
            config,
        }
    }

    /// Cache shared with this fetcher.
    pub fn cache(&self) -> &Arc<RouteCache> {
        &self.cache
    }

    /// Return a route for `waypoints`, consulting the cache before `source`.
    ///
    /// Successful, non-empty source results are cached. When every attempt
    /// fails, a straight-line fallback is returned instead and nothing is
    /// cached.
    ///
    /// ```rust,ignore
    /// let route = fetcher.fetch_route(&waypoints, &source).await;
    /// if route.is_fallback() {
    ///     show_approximate_banner();
    /// }
    /// ```
    pub async fn fetch_route(
        &self,
        waypoints: &WaypointSequence,
        source: &dyn RouteSource,
    ) -> RouteResult {
        if let Some(cached) = self.cache.get(waypoints).await {
            return cached;
        }

        let key = RouteCacheKey::for_waypoints(waypoints);
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_failure = String::new();

        for attempt in 1..=max_attempts {
            match self.run_single_attempt(waypoints, source).await {
                Ok(route) => {
                    self.cache.set(waypoints, &route).await;
                    return route;
                }
                Err(message) => {
                    self.events.record(&RouteEvent::AttemptFailed {
                        key: key.to_string(),
                        attempt,
                        max_attempts,
                        message: message.clone(),
                    });
                    last_failure = message;
                }
            }
            if attempt < max_attempts {
                self.sleeper.sleep(self.config.retry_delay).await;
            }
        }

        self.events.record(&RouteEvent::FallbackSynthesised {
            key: key.to_string(),
            attempts: max_attempts,
            message: last_failure,
        });
        synthesise_fallback_route(waypoints, self.config.fallback_speed_m_per_h)
    }

    /// One bounded source call. Errors, timeouts, and empty results all fail.
    async fn run_single_attempt(
        &self,
        waypoints: &WaypointSequence,
        source: &dyn RouteSource,
    ) -> Result<RouteResult, String> {
        let call = source.compute_route(waypoints);
        match tokio::time::timeout(self.config.attempt_timeout, call).await {
            Ok(Ok(route)) if route.is_empty() => {
                Err("routing service returned an empty route".to_owned())
            }
            Ok(Ok(route)) => Ok(route),
            Ok(Err(error)) => Err(error.to_string()),
            Err(_elapsed) => Err(format!(
                "routing attempt exceeded {} ms",
                self.config.attempt_timeout.as_millis()
            )),
        }
    }
}
