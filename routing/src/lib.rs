//! Routing library: route cache, resilient fetcher, and their adapters.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::RoutingSettings;
