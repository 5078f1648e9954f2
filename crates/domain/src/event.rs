//! Events emitted by the dispatch pipeline.
//!
//! Every lifecycle transition produces exactly one `DispatchEvent`.
//! Consumers are the live feed (operator consoles, unit clients) and the
//! audit journal; emission is best-effort and never gates the transition
//! that produced it.

use serde::{Deserialize, Serialize};

use crate::emergency::Priority;

/// A dispatch lifecycle event.
///
/// Serialized with an `event` tag and snake_case payload fields, so the
/// wire form reads e.g. `{"event":"unit_assigned","emergency_id":...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// A new emergency was logged.
    EmergencyReported {
        /// Emergency identifier.
        emergency_id: String,
        /// Scene latitude, degrees.
        latitude: f64,
        /// Scene longitude, degrees.
        longitude: f64,
        /// Reported severity.
        priority: Priority,
        /// Event time (Unix epoch milliseconds).
        at: u64,
    },

    /// The engine assigned a unit to an emergency.
    UnitAssigned {
        /// Emergency identifier.
        emergency_id: String,
        /// Assigned unit.
        unit_id: String,
        /// Great-circle distance from unit to scene, km.
        distance_km: f64,
        /// Estimated travel time, whole minutes.
        eta_minutes: u64,
        /// Event time (Unix epoch milliseconds).
        at: u64,
    },

    /// No eligible unit was found; the emergency stays pending.
    AssignmentQueued {
        /// Emergency identifier.
        emergency_id: String,
        /// Event time (Unix epoch milliseconds).
        at: u64,
    },

    /// The assigned unit acknowledged and is travelling.
    UnitEnRoute {
        /// Emergency identifier.
        emergency_id: String,
        /// Acknowledging unit.
        unit_id: String,
        /// Event time (Unix epoch milliseconds).
        at: u64,
    },

    /// The assigned unit arrived on scene.
    UnitArrived {
        /// Emergency identifier.
        emergency_id: String,
        /// Arriving unit.
        unit_id: String,
        /// Event time (Unix epoch milliseconds).
        at: u64,
    },

    /// The incident was resolved and the unit released.
    EmergencyCompleted {
        /// Emergency identifier.
        emergency_id: String,
        /// Unit that worked the incident.
        unit_id: String,
        /// Event time (Unix epoch milliseconds).
        at: u64,
    },

    /// A unit declined its assignment.
    UnitDeclined {
        /// Emergency identifier.
        emergency_id: String,
        /// Declining unit.
        unit_id: String,
        /// Replacement unit, when the search found one.
        reassigned_to: Option<String>,
        /// Event time (Unix epoch milliseconds).
        at: u64,
    },

    /// The emergency was withdrawn.
    EmergencyCancelled {
        /// Emergency identifier.
        emergency_id: String,
        /// Unit released by the cancellation, if one was assigned.
        released_unit_id: Option<String>,
        /// Event time (Unix epoch milliseconds).
        at: u64,
    },

    /// A unit joined the roster.
    UnitRegistered {
        /// Unit identifier.
        unit_id: String,
        /// Event time (Unix epoch milliseconds).
        at: u64,
    },

    /// A unit signed on or off duty.
    UnitDutyChanged {
        /// Unit identifier.
        unit_id: String,
        /// True when the unit came on duty.
        on_duty: bool,
        /// Event time (Unix epoch milliseconds).
        at: u64,
    },

    /// A unit reported a new position.
    UnitLocationUpdated {
        /// Unit identifier.
        unit_id: String,
        /// Reported latitude, degrees.
        latitude: f64,
        /// Reported longitude, degrees.
        longitude: f64,
        /// Event time (Unix epoch milliseconds).
        at: u64,
    },
}

impl DispatchEvent {
    /// Stable kind string, identical to the serde `event` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchEvent::EmergencyReported { .. } => "emergency_reported",
            DispatchEvent::UnitAssigned { .. } => "unit_assigned",
            DispatchEvent::AssignmentQueued { .. } => "assignment_queued",
            DispatchEvent::UnitEnRoute { .. } => "unit_en_route",
            DispatchEvent::UnitArrived { .. } => "unit_arrived",
            DispatchEvent::EmergencyCompleted { .. } => "emergency_completed",
            DispatchEvent::UnitDeclined { .. } => "unit_declined",
            DispatchEvent::EmergencyCancelled { .. } => "emergency_cancelled",
            DispatchEvent::UnitRegistered { .. } => "unit_registered",
            DispatchEvent::UnitDutyChanged { .. } => "unit_duty_changed",
            DispatchEvent::UnitLocationUpdated { .. } => "unit_location_updated",
        }
    }

    /// The emergency this event concerns, if any.
    pub fn emergency_id(&self) -> Option<&str> {
        match self {
            DispatchEvent::EmergencyReported { emergency_id, .. }
            | DispatchEvent::UnitAssigned { emergency_id, .. }
            | DispatchEvent::AssignmentQueued { emergency_id, .. }
            | DispatchEvent::UnitEnRoute { emergency_id, .. }
            | DispatchEvent::UnitArrived { emergency_id, .. }
            | DispatchEvent::EmergencyCompleted { emergency_id, .. }
            | DispatchEvent::UnitDeclined { emergency_id, .. }
            | DispatchEvent::EmergencyCancelled { emergency_id, .. } => Some(emergency_id),
            DispatchEvent::UnitRegistered { .. }
            | DispatchEvent::UnitDutyChanged { .. }
            | DispatchEvent::UnitLocationUpdated { .. } => None,
        }
    }

    /// The unit this event concerns, if any.
    pub fn unit_id(&self) -> Option<&str> {
        match self {
            DispatchEvent::UnitAssigned { unit_id, .. }
            | DispatchEvent::UnitEnRoute { unit_id, .. }
            | DispatchEvent::UnitArrived { unit_id, .. }
            | DispatchEvent::EmergencyCompleted { unit_id, .. }
            | DispatchEvent::UnitDeclined { unit_id, .. }
            | DispatchEvent::UnitRegistered { unit_id, .. }
            | DispatchEvent::UnitDutyChanged { unit_id, .. }
            | DispatchEvent::UnitLocationUpdated { unit_id, .. } => Some(unit_id),
            DispatchEvent::EmergencyCancelled {
                released_unit_id, ..
            } => released_unit_id.as_deref(),
            DispatchEvent::EmergencyReported { .. } | DispatchEvent::AssignmentQueued { .. } => {
                None
            }
        }
    }

    /// Event time (Unix epoch milliseconds).
    pub fn occurred_at(&self) -> u64 {
        match self {
            DispatchEvent::EmergencyReported { at, .. }
            | DispatchEvent::UnitAssigned { at, .. }
            | DispatchEvent::AssignmentQueued { at, .. }
            | DispatchEvent::UnitEnRoute { at, .. }
            | DispatchEvent::UnitArrived { at, .. }
            | DispatchEvent::EmergencyCompleted { at, .. }
            | DispatchEvent::UnitDeclined { at, .. }
            | DispatchEvent::EmergencyCancelled { at, .. }
            | DispatchEvent::UnitRegistered { at, .. }
            | DispatchEvent::UnitDutyChanged { at, .. }
            | DispatchEvent::UnitLocationUpdated { at, .. } => *at,
        }
    }
}
