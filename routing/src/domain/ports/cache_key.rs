//! Route request keys derived from ordered waypoint sequences.
use thiserror::Error;

use crate::domain::{Waypoint, WaypointSequence};

/// Decimal digits kept per coordinate (about 11 m of resolution).
pub const KEY_COORDINATE_PRECISION: i32 = 4;

const PAIR_SEPARATOR: char = ';';

/// Cache key identifying a route request by its rounded, ordered waypoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteCacheKey(String);

impl RouteCacheKey {
    /// Construct a cache key after validating that it is non-empty and trimmed.
    pub fn new(value: impl Into<String>) -> Result<Self, RouteCacheKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(RouteCacheKeyValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(RouteCacheKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Derive the key for a waypoint sequence.
    ///
    /// Each coordinate is rounded to [`KEY_COORDINATE_PRECISION`] decimals and
    /// rendered as `lat,lng`; pairs are joined with `;` in travel order.
    ///
    /// # Examples
    ///
    /// ```
    /// use itinerary_routing::domain::WaypointSequence;
    /// use itinerary_routing::domain::ports::RouteCacheKey;
    ///
    /// let waypoints = WaypointSequence::from_coordinates([
    ///     (49.24881, -122.98049),
    ///     (49.8880, -119.4960),
    /// ])?;
    /// let key = RouteCacheKey::for_waypoints(&waypoints);
    /// assert_eq!(key.as_str(), "49.2488,-122.9805;49.8880,-119.4960");
    /// # Ok::<(), itinerary_routing::domain::WaypointSequenceError>(())
    /// ```
    pub fn for_waypoints(waypoints: &WaypointSequence) -> Self {
        let rendered = waypoints
            .as_slice()
            .iter()
            .map(render_waypoint)
            .collect::<Vec<_>>()
            .join(&PAIR_SEPARATOR.to_string());
        // Rendered pairs are never blank and carry no surrounding whitespace.
        Self(rendered)
    }

    /// Borrow the underlying key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn render_waypoint(waypoint: &Waypoint) -> String {
    format!(
        "{},{}",
        render_coordinate(waypoint.latitude()),
        render_coordinate(waypoint.longitude())
    )
}

fn render_coordinate(value: f64) -> String {
    let scale = 10_f64.powi(KEY_COORDINATE_PRECISION);
    // Adding zero folds -0.0 into 0.0 so tiny negatives share a key with zero.
    let rounded = (value * scale).round() / scale + 0.0;
    format!("{rounded:.4}")
}

impl std::fmt::Display for RouteCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for RouteCacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validation errors returned when constructing [`RouteCacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteCacheKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("route cache key must not be empty")]
    Empty,
    /// Key contains leading or trailing whitespace.
    #[error("route cache key must not contain surrounding whitespace")]
    ContainsWhitespace,
}

#[cfg(test)]
mod tests {
    //! Key validation and derivation from waypoint sequences.
    use super::{RouteCacheKey, RouteCacheKeyValidationError};
    use crate::domain::WaypointSequence;
    use rstest::rstest;

    fn key(coordinates: &[(f64, f64)]) -> RouteCacheKey {
        let waypoints =
            WaypointSequence::from_coordinates(coordinates.iter().copied()).expect("valid");
        RouteCacheKey::for_waypoints(&waypoints)
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn cache_key_rejects_blank(#[case] value: &str) {
        let err = RouteCacheKey::new(value).expect_err("blank keys rejected");
        assert_eq!(err, RouteCacheKeyValidationError::Empty);
    }

    #[rstest]
    #[case(" leading")]
    #[case("trailing ")]
    fn cache_key_rejects_whitespace_padding(#[case] value: &str) {
        let err = RouteCacheKey::new(value).expect_err("padded key rejected");
        assert_eq!(err, RouteCacheKeyValidationError::ContainsWhitespace);
    }

    #[test]
    fn derived_key_is_stable_across_calls() {
        let stops = [(49.2488, -122.9805), (49.8880, -119.4960)];
        assert_eq!(key(&stops), key(&stops));
    }

    #[test]
    fn derived_key_depends_on_order() {
        let forward = key(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        let reversed = key(&[(3.0, 3.0), (2.0, 2.0), (1.0, 1.0)]);
        assert_ne!(forward, reversed);
    }

    #[rstest]
    #[case::latitude((49.2488, -122.9805), (49.2489, -122.9805))]
    #[case::longitude((49.2488, -122.9805), (49.2488, -122.9806))]
    fn coordinates_one_step_apart_produce_distinct_keys(
        #[case] left: (f64, f64),
        #[case] right: (f64, f64),
    ) {
        let a = key(&[left, (49.8880, -119.4960)]);
        let b = key(&[right, (49.8880, -119.4960)]);
        assert_ne!(a, b);
    }

    #[test]
    fn differences_below_precision_share_a_key() {
        let a = key(&[(49.248_81, -122.980_49), (10.0, 10.0)]);
        let b = key(&[(49.248_84, -122.980_46), (10.0, 10.0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn negative_zero_renders_as_zero() {
        let derived = key(&[(-0.000_01, 0.0), (1.0, 1.0)]);
        assert_eq!(derived.as_str(), "0.0000,0.0000;1.0000,1.0000");
    }

    #[test]
    fn derived_key_passes_validation() {
        let derived = key(&[(49.2488, -122.9805), (49.8880, -119.4960)]);
        let reparsed = RouteCacheKey::new(derived.as_str()).expect("valid key");
        assert_eq!(reparsed, derived);
    }
}
