//! Geographic waypoints and validated waypoint sequences.
//!
//! A [`WaypointSequence`] is the only input the route fetcher accepts. It
//! guarantees at least two finite WGS84 coordinates, so every downstream
//! operation can assume a route with one or more segments.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of waypoints needed to describe a route.
pub const MIN_WAYPOINTS: usize = 2;

/// One stop on a route, in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WaypointRepr")]
pub struct Waypoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct WaypointRepr {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<WaypointRepr> for Waypoint {
    type Error = WaypointError;

    fn try_from(repr: WaypointRepr) -> Result<Self, Self::Error> {
        Self::new(repr.latitude, repr.longitude)
    }
}

impl Waypoint {
    /// Construct a waypoint after validating coordinate ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// use itinerary_routing::domain::Waypoint;
    ///
    /// let kelowna = Waypoint::new(49.8880, -119.4960)?;
    /// assert_eq!(kelowna.latitude(), 49.8880);
    /// assert!(Waypoint::new(91.0, 0.0).is_err());
    /// # Ok::<(), itinerary_routing::domain::WaypointError>(())
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WaypointError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(WaypointError::NonFinite {
                latitude,
                longitude,
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(WaypointError::LatitudeOutOfRange { latitude });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(WaypointError::LongitudeOutOfRange { longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Validation errors for a single waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WaypointError {
    /// Latitude or longitude is NaN or infinite.
    #[error("waypoint coordinates must be finite (lat {latitude}, lng {longitude})")]
    NonFinite {
        /// Offending latitude.
        latitude: f64,
        /// Offending longitude.
        longitude: f64,
    },
    /// Latitude outside [-90, 90].
    #[error("latitude {latitude} is outside [-90, 90]")]
    LatitudeOutOfRange {
        /// Offending latitude.
        latitude: f64,
    },
    /// Longitude outside [-180, 180].
    #[error("longitude {longitude} is outside [-180, 180]")]
    LongitudeOutOfRange {
        /// Offending longitude.
        longitude: f64,
    },
}

/// Ordered list of at least [`MIN_WAYPOINTS`] waypoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WaypointSequence(Vec<Waypoint>);

impl WaypointSequence {
    /// Build a sequence, rejecting lists that cannot form a route.
    ///
    /// # Examples
    ///
    /// ```
    /// use itinerary_routing::domain::{Waypoint, WaypointSequence, WaypointSequenceError};
    ///
    /// let burnaby = Waypoint::new(49.2488, -122.9805)?;
    /// let kelowna = Waypoint::new(49.8880, -119.4960)?;
    /// let route = WaypointSequence::new(vec![burnaby, kelowna])?;
    /// assert_eq!(route.segment_count(), 1);
    ///
    /// let single = WaypointSequence::new(vec![burnaby]);
    /// assert_eq!(single, Err(WaypointSequenceError::TooFewWaypoints { count: 1 }));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, WaypointSequenceError> {
        if waypoints.len() < MIN_WAYPOINTS {
            return Err(WaypointSequenceError::TooFewWaypoints {
                count: waypoints.len(),
            });
        }
        Ok(Self(waypoints))
    }

    /// Build a sequence from raw `(latitude, longitude)` pairs.
    pub fn from_coordinates(
        coordinates: impl IntoIterator<Item = (f64, f64)>,
    ) -> Result<Self, WaypointSequenceError> {
        let waypoints = coordinates
            .into_iter()
            .enumerate()
            .map(|(index, (latitude, longitude))| {
                Waypoint::new(latitude, longitude)
                    .map_err(|source| WaypointSequenceError::InvalidWaypoint { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(waypoints)
    }

    /// Borrow the waypoints in travel order.
    pub fn as_slice(&self) -> &[Waypoint] {
        self.0.as_slice()
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of straight segments between consecutive waypoints.
    pub fn segment_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Iterate consecutive `(from, to)` pairs.
    pub fn segments(&self) -> impl Iterator<Item = (&Waypoint, &Waypoint)> {
        self.0.windows(2).filter_map(|pair| match pair {
            [from, to] => Some((from, to)),
            _ => None,
        })
    }
}

impl<'de> Deserialize<'de> for WaypointSequence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let waypoints = Vec::<Waypoint>::deserialize(deserializer)?;
        Self::new(waypoints).map_err(serde::de::Error::custom)
    }
}

/// Validation errors for a waypoint sequence.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WaypointSequenceError {
    /// Fewer than two waypoints were supplied.
    #[error("a route needs at least 2 waypoints, got {count}")]
    TooFewWaypoints {
        /// Number of waypoints supplied.
        count: usize,
    },
    /// One of the supplied coordinates is invalid.
    #[error("waypoint {index} is invalid: {source}")]
    InvalidWaypoint {
        /// Zero-based position in the input.
        index: usize,
        /// Underlying validation failure.
        #[source]
        source: WaypointError,
    },
}

#[cfg(test)]
mod tests {
    //! Validation rules for waypoints and sequences.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    fn rejects_non_finite_coordinates(#[case] latitude: f64, #[case] longitude: f64) {
        let err = Waypoint::new(latitude, longitude).expect_err("non-finite rejected");
        assert!(matches!(err, WaypointError::NonFinite { .. }));
    }

    #[rstest]
    #[case(90.5, 0.0)]
    #[case(-91.0, 0.0)]
    fn rejects_latitude_out_of_range(#[case] latitude: f64, #[case] longitude: f64) {
        let err = Waypoint::new(latitude, longitude).expect_err("latitude rejected");
        assert_eq!(err, WaypointError::LatitudeOutOfRange { latitude });
    }

    #[test]
    fn rejects_longitude_out_of_range() {
        let err = Waypoint::new(0.0, 180.01).expect_err("longitude rejected");
        assert_eq!(err, WaypointError::LongitudeOutOfRange { longitude: 180.01 });
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![(49.2488, -122.9805)])]
    fn sequence_requires_two_waypoints(#[case] coordinates: Vec<(f64, f64)>) {
        let count = coordinates.len();
        let err = WaypointSequence::from_coordinates(coordinates).expect_err("too short");
        assert_eq!(err, WaypointSequenceError::TooFewWaypoints { count });
    }

    #[test]
    fn sequence_reports_index_of_invalid_waypoint() {
        let err = WaypointSequence::from_coordinates([(49.0, -122.0), (49.0, -200.0)])
            .expect_err("bad longitude");
        assert!(matches!(
            err,
            WaypointSequenceError::InvalidWaypoint { index: 1, .. }
        ));
    }

    #[test]
    fn segments_pair_consecutive_waypoints() {
        let sequence =
            WaypointSequence::from_coordinates([(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)])
                .expect("valid sequence");
        let pairs = sequence
            .segments()
            .map(|(from, to)| (from.latitude(), to.latitude()))
            .collect::<Vec<_>>();
        assert_eq!(pairs, vec![(1.0, 2.0), (2.0, 3.0)]);
        assert_eq!(sequence.segment_count(), 2);
    }

    #[test]
    fn deserialising_enforces_minimum_length() {
        let json = r#"[{"latitude": 49.0, "longitude": -122.0}]"#;
        let err = serde_json::from_str::<WaypointSequence>(json).expect_err("too short");
        assert!(err.to_string().contains("at least 2 waypoints"));
    }

    #[test]
    fn deserialising_validates_coordinates() {
        let json = r#"{"latitude": 123.0, "longitude": -122.0}"#;
        let err = serde_json::from_str::<Waypoint>(json).expect_err("out of range");
        assert!(err.to_string().contains("latitude 123 is outside"));
    }
}
