//! Straight-line route synthesis used when the routing service is down.
//!
//! The result is shaped like a computed route so the map can draw it, but it
//! is marked [`RouteProvenance::Fallback`] and must never be cached.

use super::{
    InstructionKind, RouteInstruction, RouteProvenance, RouteResult, RouteSummary,
    WaypointSequence, haversine_distance_m,
};

/// Average speed assumed for fallback segments, in metres per hour (50 km/h).
pub const FALLBACK_SPEED_M_PER_H: f64 = 50_000.0;

const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Build a straight-line route through `waypoints` at `speed_m_per_h`.
///
/// Produces one segment per consecutive waypoint pair and one instruction per
/// waypoint: `start`, then `continue to waypoint i` for each interior stop,
/// then `arrive`. Each instruction carries the distance and time of the
/// segment that leaves it; the arrival carries zero.
///
/// # Examples
///
/// ```
/// use itinerary_routing::domain::{
///     FALLBACK_SPEED_M_PER_H, WaypointSequence, synthesise_fallback_route,
/// };
///
/// let waypoints = WaypointSequence::from_coordinates([
///     (49.2488, -122.9805),
///     (49.8880, -119.4960),
/// ])?;
/// let route = synthesise_fallback_route(&waypoints, FALLBACK_SPEED_M_PER_H);
/// assert!(route.is_fallback());
/// assert_eq!(route.instructions.len(), 2);
/// assert!((route.total_distance_km() - 261.1).abs() < 0.1);
/// # Ok::<(), itinerary_routing::domain::WaypointSequenceError>(())
/// ```
pub fn synthesise_fallback_route(waypoints: &WaypointSequence, speed_m_per_h: f64) -> RouteResult {
    let segment_distances = waypoints
        .segments()
        .map(|(from, to)| haversine_distance_m(from, to))
        .collect::<Vec<_>>();
    let segment_time = |distance_m: f64| distance_m / speed_m_per_h * SECONDS_PER_HOUR;

    let last_index = waypoints.len().saturating_sub(1);
    let instructions = (0..waypoints.len())
        .map(|index| {
            let distance_m = segment_distances.get(index).copied().unwrap_or(0.0);
            let (kind, text) = match index {
                0 => (InstructionKind::Start, "start".to_owned()),
                i if i == last_index => (InstructionKind::Arrive, "arrive".to_owned()),
                i => (
                    InstructionKind::Continue,
                    format!("continue to waypoint {}", i + 1),
                ),
            };
            RouteInstruction {
                kind,
                text,
                distance_m,
                time_s: segment_time(distance_m),
                waypoint_index: Some(index),
            }
        })
        .collect();

    let total_distance_m = segment_distances.iter().sum::<f64>();
    RouteResult {
        provenance: RouteProvenance::Fallback,
        waypoints: waypoints.as_slice().to_vec(),
        coordinates: waypoints.as_slice().to_vec(),
        instructions,
        summary: RouteSummary {
            total_distance_m,
            total_time_s: segment_time(total_distance_m),
        },
    }
}
