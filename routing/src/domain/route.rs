//! Route results shared by the routing source, the cache, and the fallback.
//!
//! The cache stores a [`RouteResult`] as an opaque JSON blob; only the
//! fetcher looks inside, and only to decide whether a fetched result is empty.

use serde::{Deserialize, Serialize};

use super::{DrivingTimeEstimate, Waypoint};

/// Where a route result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteProvenance {
    /// Produced by the external routing service.
    Computed,
    /// Synthesised locally as straight lines between waypoints.
    Fallback,
}

/// Kind of a turn instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionKind {
    /// Leave the first waypoint.
    Start,
    /// Keep going towards the next waypoint.
    Continue,
    /// Manoeuvre reported by the routing service.
    Turn,
    /// Reach the final waypoint.
    Arrive,
}

/// One step of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInstruction {
    /// Instruction kind.
    pub kind: InstructionKind,
    /// Human-readable text.
    pub text: String,
    /// Distance covered until the next instruction, in metres.
    pub distance_m: f64,
    /// Time spent until the next instruction, in seconds.
    pub time_s: f64,
    /// Index into the request waypoints, when the step starts at one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoint_index: Option<usize>,
}

/// Totals for a whole route.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    /// Total distance in metres.
    pub total_distance_m: f64,
    /// Total travel time in seconds.
    pub total_time_s: f64,
}

/// A driving route for an ordered waypoint sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    /// Whether the route was computed or synthesised.
    pub provenance: RouteProvenance,
    /// Request waypoints, in order.
    pub waypoints: Vec<Waypoint>,
    /// Path geometry.
    pub coordinates: Vec<Waypoint>,
    /// Turn-by-turn instructions.
    pub instructions: Vec<RouteInstruction>,
    /// Route totals.
    pub summary: RouteSummary,
}

impl RouteResult {
    /// True when the result carries no geometry to draw.
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// True when the result was synthesised locally.
    pub fn is_fallback(&self) -> bool {
        self.provenance == RouteProvenance::Fallback
    }

    /// Total distance in kilometres.
    pub fn total_distance_km(&self) -> f64 {
        self.summary.total_distance_m / 1_000.0
    }

    /// Total time in hours.
    pub fn total_time_hours(&self) -> f64 {
        self.summary.total_time_s / 3_600.0
    }

    /// Itinerary-style driving-time label for the route distance.
    pub fn driving_time_estimate(&self) -> DrivingTimeEstimate {
        DrivingTimeEstimate::from_distance_km(self.total_distance_km())
    }
}
