//! DTOs for decoding OSRM `route` responses.
//!
//! The adapter decodes into these transport DTOs first, then maps the first
//! route into a domain [`RouteResult`] in one pass.

use serde::Deserialize;

use crate::domain::{
    InstructionKind, RouteInstruction, RouteProvenance, RouteResult, RouteSummary, Waypoint,
    WaypointSequence,
};

/// Response code OSRM uses for success.
pub(super) const OSRM_OK: &str = "Ok";

#[derive(Debug, Deserialize)]
pub(super) struct OsrmResponseDto {
    pub(super) code: String,
    #[serde(default)]
    pub(super) message: Option<String>,
    #[serde(default)]
    pub(super) routes: Vec<OsrmRouteDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OsrmRouteDto {
    pub(super) distance: f64,
    pub(super) duration: f64,
    pub(super) geometry: OsrmGeometryDto,
    #[serde(default)]
    pub(super) legs: Vec<OsrmLegDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OsrmGeometryDto {
    /// `[longitude, latitude]` pairs.
    pub(super) coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OsrmLegDto {
    #[serde(default)]
    pub(super) steps: Vec<OsrmStepDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OsrmStepDto {
    pub(super) distance: f64,
    pub(super) duration: f64,
    #[serde(default)]
    pub(super) name: String,
    pub(super) maneuver: OsrmManeuverDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct OsrmManeuverDto {
    #[serde(rename = "type")]
    pub(super) maneuver_type: String,
    #[serde(default)]
    pub(super) modifier: Option<String>,
}

/// OSRM error payload, used to classify non-success responses.
#[derive(Debug, Deserialize)]
pub(super) struct OsrmErrorDto {
    pub(super) code: String,
    #[serde(default)]
    pub(super) message: Option<String>,
}

impl OsrmRouteDto {
    pub(super) fn into_domain_route(
        self,
        waypoints: &WaypointSequence,
    ) -> Result<RouteResult, String> {
        let coordinates = self
            .geometry
            .coordinates
            .into_iter()
            .map(|[longitude, latitude]| {
                Waypoint::new(latitude, longitude)
                    .map_err(|error| format!("route geometry holds an invalid point: {error}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let leg_count = self.legs.len();
        let instructions = self
            .legs
            .into_iter()
            .enumerate()
            .flat_map(|(leg_index, leg)| {
                let is_last_leg = leg_index + 1 == leg_count;
                leg.steps.into_iter().filter_map(move |step| {
                    step.into_instruction(leg_index, is_last_leg)
                })
            })
            .collect();

        Ok(RouteResult {
            provenance: RouteProvenance::Computed,
            waypoints: waypoints.as_slice().to_vec(),
            coordinates,
            instructions,
            summary: RouteSummary {
                total_distance_m: self.distance,
                total_time_s: self.duration,
            },
        })
    }
}

impl OsrmStepDto {
    /// Map one step. Arrivals at intermediate stops are dropped because the
    /// next leg's departure already marks the waypoint.
    fn into_instruction(self, leg_index: usize, is_last_leg: bool) -> Option<RouteInstruction> {
        let (kind, waypoint_index) = match self.maneuver.maneuver_type.as_str() {
            "depart" if leg_index == 0 => (InstructionKind::Start, Some(0)),
            "depart" => (InstructionKind::Continue, Some(leg_index)),
            "arrive" if is_last_leg => (InstructionKind::Arrive, Some(leg_index + 1)),
            "arrive" => return None,
            "continue" | "new name" => (InstructionKind::Continue, None),
            _ => (InstructionKind::Turn, None),
        };
        Some(RouteInstruction {
            kind,
            text: self.describe(),
            distance_m: self.distance,
            time_s: self.duration,
            waypoint_index,
        })
    }

    fn describe(&self) -> String {
        let action = match self.maneuver.maneuver_type.as_str() {
            "depart" => "Head".to_owned(),
            "arrive" => return "Arrive at destination".to_owned(),
            "new name" => "Continue".to_owned(),
            other => capitalise(other),
        };
        let action = match &self.maneuver.modifier {
            Some(modifier) => format!("{action} {modifier}"),
            None => action,
        };
        if self.name.is_empty() {
            action
        } else {
            format!("{action} onto {}", self.name)
        }
    }
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
