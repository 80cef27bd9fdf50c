//! Plan a driving route through waypoints, using the durable route cache.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use clap::Parser;
use itinerary_routing::RoutingSettings;
use itinerary_routing::domain::ports::{RouteSource, UnavailableRouteSource};
use itinerary_routing::domain::{
    ResilientRouteFetcher, RouteCache, RouteFetcherRuntime, TokioSleeper, Waypoint,
    WaypointSequence,
};
use itinerary_routing::outbound::events::TracingRouteEventSink;
use itinerary_routing::outbound::osrm::OsrmHttpRouteSource;
use itinerary_routing::outbound::storage::JsonFileDurableStore;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `plan-route` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "plan-route",
    about = "Fetch a driving route through waypoints, with caching and a straight-line fallback",
    version
)]
struct CliArgs {
    /// Waypoint as `lat,lng`. Repeat in travel order; at least two.
    #[arg(
        long = "waypoint",
        value_name = "lat,lng",
        value_parser = parse_waypoint,
        allow_hyphen_values = true,
        required = true
    )]
    waypoints: Vec<Waypoint>,
    /// Skip the routing service and exercise the fallback path.
    #[arg(long)]
    offline: bool,
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let waypoints = WaypointSequence::new(args.waypoints)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
    let settings = RoutingSettings::load_from_iter([OsString::from("plan-route")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;

    let mut store = JsonFileDurableStore::open(settings.store_dir(), settings.store_file())
        .map_err(|error| io::Error::other(format!("open route cache: {error}")))?;
    if let Some(quota) = settings.store_quota_bytes {
        store = store.with_quota(quota);
    }

    let events = Arc::new(TracingRouteEventSink);
    let cache = Arc::new(RouteCache::new(
        Arc::new(store),
        Arc::new(DefaultClock),
        events.clone(),
        settings.cache_config(),
    ));
    let init = cache.init().await;
    let fetcher = ResilientRouteFetcher::with_runtime(
        cache,
        RouteFetcherRuntime {
            sleeper: Arc::new(TokioSleeper),
            events,
        },
        settings.fetcher_config(),
    );

    let source: Box<dyn RouteSource> = if args.offline {
        Box::new(UnavailableRouteSource)
    } else {
        let endpoint = settings
            .osrm_endpoint()
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
        Box::new(
            OsrmHttpRouteSource::new(endpoint, settings.attempt_timeout())
                .map_err(|error| io::Error::other(format!("build OSRM client: {error}")))?,
        )
    };

    let route = fetcher.fetch_route(&waypoints, source.as_ref()).await;

    println!("cache_loaded={}", init.loaded);
    println!(
        "cache_evicted={}",
        init.cleanup.memory_evicted + init.cleanup.durable_evicted + init.cleanup.corrupt_removed
    );
    println!(
        "provenance={}",
        if route.is_fallback() {
            "fallback"
        } else {
            "computed"
        }
    );
    println!("waypoint_count={}", waypoints.len());
    println!("distance_km={:.1}", route.total_distance_km());
    println!("time_hours={:.2}", route.total_time_hours());
    println!("driving_time={}", route.driving_time_estimate());
    println!("instruction_count={}", route.instructions.len());

    Ok(())
}

fn parse_waypoint(raw: &str) -> Result<Waypoint, String> {
    let (latitude, longitude) = raw
        .split_once(',')
        .ok_or_else(|| "waypoint must be `lat,lng`".to_owned())?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|error| format!("failed to parse waypoint coordinate {value:?}: {error}"))
    };
    Waypoint::new(parse(latitude)?, parse(longitude)?).map_err(|error| error.to_string())
}
