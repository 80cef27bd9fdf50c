//! Route domain: waypoints, route results, the two-tier route cache, and the
//! resilient fetcher with its straight-line fallback.
//!
//! Public surface:
//! - `WaypointSequence`: validated request input (two or more waypoints).
//! - `RouteResult`: computed or synthesised route, cached as JSON.
//! - `RouteCache`: memory map mirrored into a `ports::DurableStore`.
//! - `ResilientRouteFetcher`: cache lookup, bounded retries, fallback.
//! - `ports`: driven-port traits implemented in `crate::outbound`.

pub mod ports;

mod driving_time;
mod fallback;
mod geodesy;
mod route;
mod route_cache;
mod route_fetcher;
mod waypoint;

pub use self::driving_time::{DrivingTimeEstimate, ITINERARY_SPEED_KMH};
pub use self::fallback::{FALLBACK_SPEED_M_PER_H, synthesise_fallback_route};
pub use self::geodesy::{EARTH_RADIUS_M, haversine_distance_m};
pub use self::route::{
    InstructionKind, RouteInstruction, RouteProvenance, RouteResult, RouteSummary,
};
pub use self::route_cache::{
    CleanupReport, DEFAULT_ROUTE_CACHE_PREFIX, DEFAULT_ROUTE_CACHE_TTL, InitReport, RouteCache,
    RouteCacheConfig,
};
pub use self::route_fetcher::{
    ResilientRouteFetcher, RetrySleeper, RouteFetcherConfig, RouteFetcherRuntime, TokioSleeper,
};
pub use self::waypoint::{
    MIN_WAYPOINTS, Waypoint, WaypointError, WaypointSequence, WaypointSequenceError,
};
