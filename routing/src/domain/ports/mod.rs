//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Ports describe how the route layer expects to talk to driven adapters: the
//! external routing service, the durable key/value store, and the event sink.

mod macros;
pub(crate) use macros::define_port_error;

mod cache_key;
mod durable_store;
mod route_events;
mod route_source;

pub use cache_key::{KEY_COORDINATE_PRECISION, RouteCacheKey, RouteCacheKeyValidationError};
#[cfg(test)]
pub use durable_store::MockDurableStore;
pub use durable_store::{DurableStore, DurableStoreError};
#[cfg(test)]
pub use route_events::MockRouteEventSink;
pub use route_events::{
    DiscardRouteEvents, EventSeverity, RouteEvent, RouteEventSink, StoreOperation,
};
#[cfg(test)]
pub use route_source::MockRouteSource;
pub use route_source::{RouteSource, RouteSourceError, UnavailableRouteSource};
