//! Travel-time estimation.

use std::fmt;

/// An estimated travel time, held in whole minutes.
///
/// Estimates always round up: a unit that is 6.3 minutes out is reported
/// as 7 minutes, never 6. Rendering follows the control-room convention
/// of `H:MM`, e.g. `0:07` or `1:15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eta {
    /// Whole minutes of travel, rounded up.
    pub minutes: u64,
}

impl Eta {
    /// Estimates travel time for `distance_km` at a constant `speed_kmh`.
    ///
    /// `speed_kmh` must be positive; dispatch configuration enforces this
    /// before any estimate is requested.
    pub fn estimate(distance_km: f64, speed_kmh: f64) -> Eta {
        let minutes = (distance_km / speed_kmh * 60.0).ceil() as u64;
        Eta { minutes }
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}
