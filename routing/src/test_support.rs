//! Test utilities for the routing crate.
//!
//! This module provides shared doubles for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is compiled for tests and behind the
//! `test-support` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use tempfile::TempDir;

use crate::domain::ports::{
    DurableStore, DurableStoreError, RouteEvent, RouteEventSink, RouteSource, RouteSourceError,
};
use crate::domain::{
    InstructionKind, RetrySleeper, RouteInstruction, RouteProvenance, RouteResult, RouteSummary,
    WaypointSequence,
};
use crate::outbound::storage::{
    DEFAULT_STORE_FILE_NAME, InMemoryDurableStore, JsonFileDurableStore,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex"),
    }
}

/// A fixed instant used as "now" by most tests.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).single() {
        Some(now) => now,
        None => panic!("fixed test instant must be valid"),
    }
}

/// Clock whose current time only moves when a test advances it.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *lock(&self.0, "clock") += delta;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.0, "clock") = now;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0, "clock")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl RetrySleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Sleeper that returns immediately and remembers every requested delay.
#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        lock(&self.0, "sleeper").clone()
    }
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0, "sleeper").push(duration);
    }
}

/// Event sink that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingEventSink(Mutex<Vec<RouteEvent>>);

impl RecordingEventSink {
    pub fn events(&self) -> Vec<RouteEvent> {
        lock(&self.0, "events").clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        lock(&self.0, "events").iter().map(RouteEvent::kind).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        lock(&self.0, "events")
            .iter()
            .filter(|event| event.kind() == kind)
            .count()
    }

    pub fn clear(&self) {
        lock(&self.0, "events").clear();
    }
}

impl RouteEventSink for RecordingEventSink {
    fn record(&self, event: &RouteEvent) {
        lock(&self.0, "events").push(event.clone());
    }
}

/// One scripted response from [`ScriptedRouteSource`].
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Return this route.
    Route(RouteResult),
    /// Return a route with empty geometry.
    Empty,
    /// Return this error.
    Fail(RouteSourceError),
    /// Never complete.
    Hang,
}

/// Route source replaying scripted outcomes in order.
///
/// Once the script is exhausted every further call fails with a transport
/// error.
#[derive(Default)]
pub struct ScriptedRouteSource {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    calls: AtomicUsize,
}

impl ScriptedRouteSource {
    pub fn new(script: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Source that fails every call.
    pub fn always_failing() -> Self {
        Self::default()
    }

    /// Source failing `failures` times before returning `route`.
    pub fn failing_then(failures: usize, route: RouteResult) -> Self {
        let failing = (0..failures).map(|attempt| {
            ScriptedOutcome::Fail(RouteSourceError::transport(format!(
                "scripted failure {}",
                attempt + 1
            )))
        });
        Self::new(failing.chain([ScriptedOutcome::Route(route)]))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RouteSource for ScriptedRouteSource {
    async fn compute_route(
        &self,
        waypoints: &WaypointSequence,
    ) -> Result<RouteResult, RouteSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.script, "script").pop_front();
        match next {
            Some(ScriptedOutcome::Route(route)) => Ok(route),
            Some(ScriptedOutcome::Empty) => {
                let mut route = computed_route(waypoints);
                route.coordinates.clear();
                Ok(route)
            }
            Some(ScriptedOutcome::Fail(error)) => Err(error),
            Some(ScriptedOutcome::Hang) => std::future::pending().await,
            None => Err(RouteSourceError::transport("scripted source exhausted")),
        }
    }
}

/// A plausible computed route through `waypoints`.
pub fn computed_route(waypoints: &WaypointSequence) -> RouteResult {
    let points = waypoints.as_slice().to_vec();
    let last = points.len().saturating_sub(1);
    RouteResult {
        provenance: RouteProvenance::Computed,
        waypoints: points.clone(),
        coordinates: points,
        instructions: vec![
            RouteInstruction {
                kind: InstructionKind::Start,
                text: "Head east on Kingsway".to_owned(),
                distance_m: 390_000.0,
                time_s: 14_400.0,
                waypoint_index: Some(0),
            },
            RouteInstruction {
                kind: InstructionKind::Arrive,
                text: "Arrive at destination".to_owned(),
                distance_m: 0.0,
                time_s: 0.0,
                waypoint_index: Some(last),
            },
        ],
        summary: RouteSummary {
            total_distance_m: 390_000.0,
            total_time_s: 14_400.0,
        },
    }
}

/// Durable store whose operations can be switched to fail.
#[derive(Debug, Default)]
pub struct FaultyDurableStore {
    inner: InMemoryDurableStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_listing: AtomicBool,
}

impl FaultyDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryDurableStore {
        &self.inner
    }

    pub fn fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_listing(&self, enabled: bool) {
        self.fail_listing.store(enabled, Ordering::SeqCst);
    }
}

#[async_trait]
impl DurableStore for FaultyDurableStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DurableStoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DurableStoreError::unavailable("reads disabled"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DurableStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DurableStoreError::quota_exceeded("writes disabled"));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), DurableStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DurableStoreError::unavailable("writes disabled"));
        }
        self.inner.remove(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, DurableStoreError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(DurableStoreError::unavailable("listing disabled"));
        }
        self.inner.keys().await
    }
}

/// JSON file store inside a fresh temporary directory.
///
/// Keep the returned [`TempDir`] alive for as long as the store is used.
pub fn temp_json_store() -> (TempDir, JsonFileDurableStore) {
    let directory = match tempfile::tempdir() {
        Ok(directory) => directory,
        Err(error) => panic!("create temp dir: {error}"),
    };
    match JsonFileDurableStore::open(directory.path(), DEFAULT_STORE_FILE_NAME) {
        Ok(store) => (directory, store),
        Err(error) => panic!("open json store: {error}"),
    }
}
