//! Transition violations raised by the domain state machines.

use thiserror::Error;

/// A rejected state-machine transition.
///
/// These are business-rule violations, not system faults: callers surface
/// them to the client that attempted the transition and never coerce the
/// record into the requested state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested edge does not exist in the state machine.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// State the record is currently in (wire form).
        from: String,
        /// State the caller asked for (wire form).
        to: String,
    },

    /// The record is in a terminal state and rejects all further
    /// transitions.
    #[error("record is terminal in state {state}")]
    AlreadyTerminal {
        /// The terminal state (wire form).
        state: String,
    },

    /// The unit is bound to an active emergency and cannot take the
    /// requested action until released.
    #[error("unit {unit_id} is bound to emergency {emergency_id}")]
    UnitBusy {
        /// Unit attempting the action.
        unit_id: String,
        /// Emergency it is still bound to.
        emergency_id: String,
    },
}
