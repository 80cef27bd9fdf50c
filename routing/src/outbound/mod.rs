//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits:
//!
//! - **osrm**: reqwest-backed `RouteSource` against an OSRM server
//! - **storage**: in-memory and JSON-file `DurableStore` implementations
//! - **events**: `tracing`-backed `RouteEventSink`
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod events;
pub mod osrm;
pub mod storage;
