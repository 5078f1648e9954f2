//! Registry-level failures.

use lifelink_domain::TransitionError;
use thiserror::Error;

/// Errors raised by the unit roster and emergency log.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No unit registered under the given id.
    #[error("unit {0} is not registered")]
    UnitNotFound(String),

    /// No emergency recorded under the given id.
    #[error("emergency {0} is not recorded")]
    EmergencyNotFound(String),

    /// A unit with this id already exists.
    #[error("unit {0} is already registered")]
    DuplicateUnit(String),

    /// An emergency with this id already exists.
    #[error("emergency {0} is already recorded")]
    DuplicateEmergency(String),

    /// The unit has been deactivated and no longer takes duty changes.
    #[error("unit {0} is deactivated")]
    UnitInactive(String),

    /// The unit was no longer claimable when the commit ran. The
    /// assignment loop treats this as a signal to re-rank and retry.
    #[error("unit {unit_id} could not be claimed for {emergency_id}")]
    ClaimConflict {
        /// Unit that failed the claim.
        unit_id: String,
        /// Emergency the claim was for.
        emergency_id: String,
    },

    /// A domain state-machine violation, passed through unchanged.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}
