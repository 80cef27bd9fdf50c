//! Routing configuration loaded via OrthoConfig.
//!
//! Every field is optional; accessors fall back to the documented defaults.
//! Environment variables use the `ROUTING_` prefix, for example
//! `ROUTING_MAX_ATTEMPTS=6`.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{
    DEFAULT_ROUTE_CACHE_PREFIX, FALLBACK_SPEED_M_PER_H, RouteCacheConfig, RouteFetcherConfig,
};
use crate::outbound::storage::DEFAULT_STORE_FILE_NAME;

/// Public OSRM demo server.
pub const DEFAULT_OSRM_ENDPOINT: &str = "https://router.project-osrm.org/";
const DEFAULT_STORE_DIR: &str = ".itinerary-cache";
const DEFAULT_CACHE_TTL_HOURS: u64 = 24;
const DEFAULT_MAX_ATTEMPTS: u32 = 4;
const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 10;

/// Configuration values for the route cache, fetcher, and OSRM adapter.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ROUTING")]
pub struct RoutingSettings {
    /// Base URL of the OSRM server.
    pub osrm_endpoint: Option<String>,
    /// Directory holding the durable cache document.
    pub store_dir: Option<PathBuf>,
    /// File name of the durable cache document.
    pub store_file: Option<String>,
    /// Optional byte quota for the durable cache document.
    pub store_quota_bytes: Option<usize>,
    /// Namespace prefix for durable cache keys.
    pub key_prefix: Option<String>,
    /// Cache entry lifetime in hours.
    pub cache_ttl_hours: Option<u64>,
    /// Routing attempts per request, including the first.
    pub max_attempts: Option<u32>,
    /// Delay between attempts in milliseconds.
    pub retry_delay_ms: Option<u64>,
    /// Per-attempt timeout in seconds.
    pub attempt_timeout_secs: Option<u64>,
}

/// Errors raised while interpreting settings.
#[derive(Debug, thiserror::Error)]
pub enum RoutingSettingsError {
    /// The OSRM endpoint is not a valid absolute URL.
    #[error("invalid OSRM endpoint {value:?}: {source}")]
    InvalidEndpoint {
        /// Configured value.
        value: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
}

impl RoutingSettings {
    /// Return the configured OSRM endpoint, falling back to the public server.
    pub fn osrm_endpoint(&self) -> Result<Url, RoutingSettingsError> {
        let value = self
            .osrm_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_OSRM_ENDPOINT);
        Url::parse(value).map_err(|source| RoutingSettingsError::InvalidEndpoint {
            value: value.to_owned(),
            source,
        })
    }

    /// Return the store directory, falling back to `.itinerary-cache`.
    pub fn store_dir(&self) -> PathBuf {
        self.store_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR))
    }

    /// Return the store document name.
    pub fn store_file(&self) -> &str {
        self.store_file.as_deref().unwrap_or(DEFAULT_STORE_FILE_NAME)
    }

    /// Return the durable key prefix.
    pub fn key_prefix(&self) -> &str {
        self.key_prefix
            .as_deref()
            .unwrap_or(DEFAULT_ROUTE_CACHE_PREFIX)
    }

    /// Return the cache TTL.
    pub fn cache_ttl(&self) -> Duration {
        let hours = self.cache_ttl_hours.unwrap_or(DEFAULT_CACHE_TTL_HOURS);
        Duration::from_secs(hours.saturating_mul(60 * 60))
    }

    /// Return the attempt bound, never below one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS).max(1)
    }

    /// Return the delay between attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS))
    }

    /// Return the per-attempt timeout.
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(
            self.attempt_timeout_secs
                .unwrap_or(DEFAULT_ATTEMPT_TIMEOUT_SECS),
        )
    }

    /// Cache configuration derived from these settings.
    pub fn cache_config(&self) -> RouteCacheConfig {
        RouteCacheConfig {
            ttl: self.cache_ttl(),
            key_prefix: self.key_prefix().to_owned(),
        }
    }

    /// Fetcher configuration derived from these settings.
    pub fn fetcher_config(&self) -> RouteFetcherConfig {
        RouteFetcherConfig {
            max_attempts: self.max_attempts(),
            retry_delay: self.retry_delay(),
            attempt_timeout: self.attempt_timeout(),
            fallback_speed_m_per_h: FALLBACK_SPEED_M_PER_H,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for routing configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 9] = [
        "ROUTING_OSRM_ENDPOINT",
        "ROUTING_STORE_DIR",
        "ROUTING_STORE_FILE",
        "ROUTING_STORE_QUOTA_BYTES",
        "ROUTING_KEY_PREFIX",
        "ROUTING_CACHE_TTL_HOURS",
        "ROUTING_MAX_ATTEMPTS",
        "ROUTING_RETRY_DELAY_MS",
        "ROUTING_ATTEMPT_TIMEOUT_SECS",
    ];

    fn load_from_empty_args() -> RoutingSettings {
        RoutingSettings::load_from_iter([OsString::from("plan-route")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.osrm_endpoint().expect("endpoint").as_str(),
            DEFAULT_OSRM_ENDPOINT
        );
        assert_eq!(settings.store_dir(), PathBuf::from(DEFAULT_STORE_DIR));
        assert_eq!(settings.store_file(), DEFAULT_STORE_FILE_NAME);
        assert!(settings.store_quota_bytes.is_none());
        assert_eq!(settings.cache_config(), RouteCacheConfig::default());
        assert_eq!(settings.fetcher_config(), RouteFetcherConfig::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("ROUTING_OSRM_ENDPOINT", Some("http://localhost:5000/".to_owned())),
            ("ROUTING_STORE_DIR", Some("/tmp/itinerary".to_owned())),
            ("ROUTING_STORE_FILE", Some("routes.json".to_owned())),
            ("ROUTING_STORE_QUOTA_BYTES", Some("5242880".to_owned())),
            ("ROUTING_KEY_PREFIX", Some("trip:".to_owned())),
            ("ROUTING_CACHE_TTL_HOURS", Some("6".to_owned())),
            ("ROUTING_MAX_ATTEMPTS", Some("6".to_owned())),
            ("ROUTING_RETRY_DELAY_MS", Some("500".to_owned())),
            ("ROUTING_ATTEMPT_TIMEOUT_SECS", Some("3".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.osrm_endpoint().expect("endpoint").as_str(),
            "http://localhost:5000/"
        );
        assert_eq!(settings.store_dir(), PathBuf::from("/tmp/itinerary"));
        assert_eq!(settings.store_file(), "routes.json");
        assert_eq!(settings.store_quota_bytes, Some(5_242_880));
        assert_eq!(
            settings.cache_config(),
            RouteCacheConfig {
                ttl: Duration::from_secs(6 * 60 * 60),
                key_prefix: "trip:".to_owned(),
            }
        );
        let fetcher = settings.fetcher_config();
        assert_eq!(fetcher.max_attempts, 6);
        assert_eq!(fetcher.retry_delay, Duration::from_millis(500));
        assert_eq!(fetcher.attempt_timeout, Duration::from_secs(3));
    }

    #[rstest]
    fn zero_attempts_are_raised_to_one() {
        let settings = RoutingSettings {
            max_attempts: Some(0),
            ..RoutingSettings::default()
        };
        assert_eq!(settings.max_attempts(), 1);
    }

    #[rstest]
    fn relative_endpoint_is_rejected() {
        let settings = RoutingSettings {
            osrm_endpoint: Some("router.local".to_owned()),
            ..RoutingSettings::default()
        };
        assert!(matches!(
            settings.osrm_endpoint(),
            Err(RoutingSettingsError::InvalidEndpoint { .. })
        ));
    }
}
