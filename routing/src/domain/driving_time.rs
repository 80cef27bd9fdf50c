//! Coarse driving-time labels for itinerary legs.

use std::fmt;

/// Average speed assumed by itinerary labels, in km/h.
pub const ITINERARY_SPEED_KMH: f64 = 80.0;

/// Whole hours plus rounded minutes at [`ITINERARY_SPEED_KMH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrivingTimeEstimate {
    hours: u64,
    minutes: u64,
}

impl DrivingTimeEstimate {
    /// Estimate driving time for `distance_km`.
    ///
    /// Negative or non-finite distances yield a zero estimate.
    ///
    /// # Examples
    ///
    /// ```
    /// use itinerary_routing::domain::DrivingTimeEstimate;
    ///
    /// let estimate = DrivingTimeEstimate::from_distance_km(200.0);
    /// assert_eq!((estimate.hours(), estimate.minutes()), (2, 30));
    /// assert_eq!(estimate.to_string(), "about 2 h 30 min");
    /// ```
    pub fn from_distance_km(distance_km: f64) -> Self {
        if !distance_km.is_finite() || distance_km <= 0.0 {
            return Self {
                hours: 0,
                minutes: 0,
            };
        }
        let whole_hours = (distance_km / ITINERARY_SPEED_KMH).floor();
        let remainder_km = distance_km % ITINERARY_SPEED_KMH;
        let minutes = (remainder_km / ITINERARY_SPEED_KMH * 60.0).round();

        // Both values are finite, non-negative, and already whole numbers.
        let (hours, minutes) = (whole_hours as u64, minutes as u64);
        if minutes >= 60 {
            return Self {
                hours: hours.saturating_add(1),
                minutes: 0,
            };
        }
        Self { hours, minutes }
    }

    /// Whole hours.
    pub fn hours(&self) -> u64 {
        self.hours
    }

    /// Remaining minutes, always below 60.
    pub fn minutes(&self) -> u64 {
        self.minutes
    }
}

impl fmt::Display for DrivingTimeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes == 0 {
            write!(f, "about {} h", self.hours)
        } else {
            write!(f, "about {} h {} min", self.hours, self.minutes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(160.0, 2, 0, "about 2 h")]
    #[case(390.0, 4, 53, "about 4 h 53 min")]
    #[case(40.0, 0, 30, "about 0 h 30 min")]
    #[case(79.99, 1, 0, "about 1 h")]
    #[case(-5.0, 0, 0, "about 0 h")]
    fn estimates_hours_and_minutes(
        #[case] distance_km: f64,
        #[case] hours: u64,
        #[case] minutes: u64,
        #[case] label: &str,
    ) {
        let estimate = DrivingTimeEstimate::from_distance_km(distance_km);
        assert_eq!(estimate.hours(), hours);
        assert_eq!(estimate.minutes(), minutes);
        assert_eq!(estimate.to_string(), label);
    }
}
