//! OSRM outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `RouteSource` port
//! against the OSRM `route` service.

mod dto;
mod http_source;

pub use http_source::{DEFAULT_OSRM_PROFILE, OsrmHttpRouteSource};
