//! Driven port for the external routing service.
//!
//! The domain owns the request shape (a validated waypoint sequence) and the
//! response contract, so the resilient fetcher stays adapter-agnostic.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{RouteResult, WaypointSequence};

define_port_error! {
    /// Errors surfaced while computing a route.
    pub enum RouteSourceError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "routing transport failed: {message}",
        /// The routing call exceeded its timeout.
        Timeout { message: String } =>
            "routing timeout: {message}",
        /// The routing service rate-limited the request.
        RateLimited { message: String } =>
            "routing service rate limited request: {message}",
        /// The routing response could not be decoded.
        Decode { message: String } =>
            "routing response decode failed: {message}",
        /// The service answered but found no route between the waypoints.
        NoRoute { message: String } =>
            "no route found: {message}",
        /// Adapter rejected the request before execution.
        InvalidRequest { message: String } =>
            "routing request invalid: {message}",
    }
}

/// Port computing a driving route for an ordered waypoint sequence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteSource: Send + Sync {
    /// Compute a route through `waypoints` in order.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use itinerary_routing::domain::WaypointSequence;
    /// use itinerary_routing::domain::ports::{RouteSource, UnavailableRouteSource};
    ///
    /// let waypoints = WaypointSequence::from_coordinates([(49.2, -122.9), (49.8, -119.4)])?;
    /// let error = UnavailableRouteSource.compute_route(&waypoints).await.unwrap_err();
    /// assert!(error.to_string().contains("unavailable"));
    /// ```
    async fn compute_route(
        &self,
        waypoints: &WaypointSequence,
    ) -> Result<RouteResult, RouteSourceError>;
}

/// Fixture implementation that always reports an unavailable service.
///
/// Useful where only the cache or fallback behaviour is under test.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRouteSource;

#[async_trait]
impl RouteSource for UnavailableRouteSource {
    async fn compute_route(
        &self,
        _waypoints: &WaypointSequence,
    ) -> Result<RouteResult, RouteSourceError> {
        Err(RouteSourceError::transport("routing service unavailable"))
    }
}
