//! Great-circle helpers used by fallback route synthesis.

use super::Waypoint;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two waypoints in metres (haversine).
///
/// # Examples
///
/// ```
/// use itinerary_routing::domain::{Waypoint, haversine_distance_m};
///
/// let equator = Waypoint::new(0.0, 0.0)?;
/// let one_degree_north = Waypoint::new(1.0, 0.0)?;
/// let metres = haversine_distance_m(&equator, &one_degree_north);
/// assert!((metres - 111_195.0).abs() < 1.0);
/// # Ok::<(), itinerary_routing::domain::WaypointError>(())
/// ```
pub fn haversine_distance_m(from: &Waypoint, to: &Waypoint) -> f64 {
    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let delta_lat = (to.latitude() - from.latitude()).to_radians();
    let delta_lng = (to.longitude() - from.longitude()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> Waypoint {
        Waypoint::new(latitude, longitude).expect("valid waypoint")
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let kelowna = point(49.8880, -119.4960);
        assert_eq!(haversine_distance_m(&kelowna, &kelowna), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let burnaby = point(49.2488, -122.9805);
        let kelowna = point(49.8880, -119.4960);
        let there = haversine_distance_m(&burnaby, &kelowna);
        let back = haversine_distance_m(&kelowna, &burnaby);
        assert!((there - back).abs() < 1e-6);
    }

    #[test]
    fn burnaby_to_kelowna_is_about_261_km() {
        let metres = haversine_distance_m(&point(49.2488, -122.9805), &point(49.8880, -119.4960));
        assert!((metres - 261_113.0).abs() < 50.0, "got {metres}");
    }

    #[test]
    fn antipodal_points_span_half_the_circumference() {
        let metres = haversine_distance_m(&point(0.0, 0.0), &point(0.0, 180.0));
        assert!((metres - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }
}
