//! Geospatial primitives for LifeLink dispatch.
//!
//! Everything the dispatch pipeline knows about the physical world lives
//! here: WGS84 coordinates, great-circle distance, and travel-time
//! estimation. The crate is deliberately free of any dispatch-domain
//! types so it can be reused by tooling (simulators, replay analysis)
//! without dragging in the rest of the workspace.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod eta;
mod haversine;

pub use eta::Eta;
pub use haversine::{haversine_km, EARTH_RADIUS_KM};

/// Errors raised by coordinate validation.
#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    /// Latitude or longitude outside the WGS84 envelope, or not finite.
    #[error("coordinate out of range: ({latitude}, {longitude})")]
    OutOfRange {
        /// Offending latitude, degrees.
        latitude: f64,
        /// Offending longitude, degrees.
        longitude: f64,
    },
}

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Degrees north of the equator, in `[-90, 90]`.
    pub latitude: f64,
    /// Degrees east of the prime meridian, in `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a coordinate without range checking.
    ///
    /// Callers on the ingest path should prefer [`Coordinate::validated`];
    /// this constructor exists for values already known to be in range
    /// (constants, values read back from the store).
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a coordinate, rejecting out-of-range or non-finite input.
    pub fn validated(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let coord = Self {
            latitude,
            longitude,
        };
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(GeoError::OutOfRange {
                latitude,
                longitude,
            })
        }
    }

    /// True when both components are finite and inside the WGS84 envelope.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance from `self` to `other` in kilometres.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(*self, *other)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_accepts_in_range_point() {
        let coord = Coordinate::validated(40.7128, -74.0060).unwrap();
        assert_eq!(coord.latitude, 40.7128);
        assert_eq!(coord.longitude, -74.0060);
    }

    #[test]
    fn validated_rejects_out_of_range_latitude() {
        let err = Coordinate::validated(91.0, 0.0).unwrap_err();
        assert_eq!(
            err,
            GeoError::OutOfRange {
                latitude: 91.0,
                longitude: 0.0
            }
        );
    }

    #[test]
    fn validated_rejects_non_finite_components() {
        assert!(Coordinate::validated(f64::NAN, 0.0).is_err());
        assert!(Coordinate::validated(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn poles_and_antimeridian_are_valid() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
    }

    #[test]
    fn serde_round_trip_preserves_fields() {
        let coord = Coordinate::new(40.758, -73.9855);
        let json = serde_json::to_string(&coord).unwrap();
        let back: Coordinate = serde_json::from_str(&json).unwrap();
        assert_eq!(coord, back);
    }
}
