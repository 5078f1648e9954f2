//! Dispatch pipeline failures.

use lifelink_geo::GeoError;
use lifelink_registry::RegistryError;
use thiserror::Error;

/// Errors surfaced by the assignment engine and lifecycle coordinator.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Scene coordinates outside the WGS84 envelope or not finite.
    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        /// Rejected latitude, degrees.
        latitude: f64,
        /// Rejected longitude, degrees.
        longitude: f64,
    },

    /// The assignment loop lost every permitted retry to concurrent
    /// claims. Transient: the caller may simply try again.
    #[error("assignment for {emergency_id} abandoned after {conflicts} claim conflicts")]
    AssignmentConflict {
        /// Emergency the assignment was for.
        emergency_id: String,
        /// Claim races lost before giving up.
        conflicts: u32,
    },

    /// A registry or state-machine failure, passed through unchanged.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<GeoError> for DispatchError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::OutOfRange {
                latitude,
                longitude,
            } => DispatchError::InvalidCoordinates {
                latitude,
                longitude,
            },
        }
    }
}
