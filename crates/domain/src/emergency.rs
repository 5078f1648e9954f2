//! Emergency incident records and the dispatch lifecycle state machine.

use lifelink_geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::TransitionError;

/// Severity of an emergency, as reported by the caller or triage.
///
/// Priority feeds the travel-speed assumption used for ETA estimates;
/// the speed table itself lives in dispatch configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Life-threatening; highest assumed response speed.
    Critical,
    /// Urgent.
    High,
    /// Standard response.
    Medium,
    /// Non-urgent.
    Low,
}

impl Priority {
    /// Wire form of the priority, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// True for life-threatening incidents.
    pub fn is_critical(&self) -> bool {
        matches!(self, Priority::Critical)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emergency lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyStatus {
    /// Logged, no unit assigned yet.
    Pending,
    /// A unit has been assigned but has not acknowledged.
    Dispatched,
    /// The assigned unit acknowledged and is travelling.
    EnRoute,
    /// The assigned unit is on scene.
    AtScene,
    /// Resolved; terminal.
    Completed,
    /// Terminally declined; terminal.
    Declined,
    /// Withdrawn before resolution; terminal.
    Cancelled,
}

impl EmergencyStatus {
    /// Wire form of the status, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencyStatus::Pending => "pending",
            EmergencyStatus::Dispatched => "dispatched",
            EmergencyStatus::EnRoute => "en_route",
            EmergencyStatus::AtScene => "at_scene",
            EmergencyStatus::Completed => "completed",
            EmergencyStatus::Declined => "declined",
            EmergencyStatus::Cancelled => "cancelled",
        }
    }

    /// Check if the status is terminal (completed, declined or cancelled).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EmergencyStatus::Completed | EmergencyStatus::Declined | EmergencyStatus::Cancelled
        )
    }

    /// Check if transition to new status is valid.
    pub fn can_transition_to(&self, new_status: EmergencyStatus) -> bool {
        match (self, new_status) {
            // From Pending
            (EmergencyStatus::Pending, EmergencyStatus::Dispatched) => true,
            (EmergencyStatus::Pending, EmergencyStatus::Cancelled) => true,
            // From Dispatched
            (EmergencyStatus::Dispatched, EmergencyStatus::EnRoute) => true,
            (EmergencyStatus::Dispatched, EmergencyStatus::AtScene) => true,
            (EmergencyStatus::Dispatched, EmergencyStatus::Pending) => true,
            (EmergencyStatus::Dispatched, EmergencyStatus::Declined) => true,
            (EmergencyStatus::Dispatched, EmergencyStatus::Cancelled) => true,
            // From EnRoute
            (EmergencyStatus::EnRoute, EmergencyStatus::AtScene) => true,
            // From AtScene
            (EmergencyStatus::AtScene, EmergencyStatus::Completed) => true,
            // Terminal states cannot transition
            _ => false,
        }
    }
}

impl fmt::Display for EmergencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied incident context, carried verbatim on the record.
///
/// Nothing in the dispatch pipeline branches on these fields; they exist
/// for the responding crew and the operator console.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentDetails {
    /// Street address or landmark description of the scene.
    #[serde(default)]
    pub address: Option<String>,

    /// Incident category, e.g. `cardiac`, `trauma`, `fire`.
    #[serde(default)]
    pub category: Option<String>,

    /// Name of the reporting caller.
    #[serde(default)]
    pub caller_name: Option<String>,

    /// Callback number for the reporting caller.
    #[serde(default)]
    pub caller_phone: Option<String>,

    /// Free-form notes from call intake.
    #[serde(default)]
    pub notes: Option<String>,

    /// Additional metadata passed through untouched.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// An emergency incident moving through the dispatch lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emergency {
    /// Unique identifier, `EMG-{epoch_ms}-{SUFFIX}`.
    pub id: String,

    /// Scene location, validated at ingestion.
    pub location: Coordinate,

    /// Reported severity.
    pub priority: Priority,

    /// Current lifecycle state.
    pub status: EmergencyStatus,

    /// The unit currently assigned; `None` while Pending.
    pub assigned_unit_id: Option<String>,

    /// Units that declined this emergency; excluded from candidate
    /// searches on reassignment.
    pub declined_by: Vec<String>,

    /// Caller-supplied context.
    pub details: IncidentDetails,

    /// When the emergency was logged (Unix epoch milliseconds).
    pub created_at: u64,

    /// When a unit was first assigned; set once, never rewound across
    /// reassignments.
    pub dispatched_at: Option<u64>,

    /// When the assigned unit arrived on scene; set once.
    pub arrived_at: Option<u64>,

    /// When the incident was completed; set once.
    pub completed_at: Option<u64>,

    /// Timestamp of last mutation.
    pub updated_at: u64,
}

impl Emergency {
    /// Log a new pending emergency.
    pub fn new(
        id: String,
        location: Coordinate,
        priority: Priority,
        details: IncidentDetails,
        timestamp: u64,
    ) -> Self {
        Self {
            id,
            location,
            priority,
            status: EmergencyStatus::Pending,
            assigned_unit_id: None,
            declined_by: Vec::new(),
            details,
            created_at: timestamp,
            dispatched_at: None,
            arrived_at: None,
            completed_at: None,
            updated_at: timestamp,
        }
    }

    /// Check if the emergency is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Assign a unit (Pending → Dispatched). `dispatched_at` is set on
    /// the first assignment only.
    pub fn assign(&mut self, unit_id: &str, timestamp: u64) -> Result<(), TransitionError> {
        self.transition(EmergencyStatus::Dispatched, timestamp)?;
        self.assigned_unit_id = Some(unit_id.to_string());
        if self.dispatched_at.is_none() {
            self.dispatched_at = Some(timestamp);
        }
        Ok(())
    }

    /// Swap the assignee while staying Dispatched (decline reassignment).
    pub fn reassign(&mut self, unit_id: &str, timestamp: u64) -> Result<(), TransitionError> {
        self.guard_not_terminal()?;
        if self.status != EmergencyStatus::Dispatched {
            return Err(TransitionError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: EmergencyStatus::Dispatched.as_str().to_string(),
            });
        }
        self.assigned_unit_id = Some(unit_id.to_string());
        self.updated_at = timestamp;
        Ok(())
    }

    /// Return to the pending pool (Dispatched → Pending), clearing the
    /// assignment. Used when a decline leaves no eligible replacement.
    pub fn revert_to_pending(&mut self, timestamp: u64) -> Result<(), TransitionError> {
        self.transition(EmergencyStatus::Pending, timestamp)?;
        self.assigned_unit_id = None;
        Ok(())
    }

    /// The assigned unit acknowledged the dispatch (Dispatched → EnRoute).
    pub fn mark_en_route(&mut self, timestamp: u64) -> Result<(), TransitionError> {
        self.transition(EmergencyStatus::EnRoute, timestamp)
    }

    /// The assigned unit arrived on scene (Dispatched/EnRoute → AtScene).
    /// `arrived_at` is set once.
    pub fn mark_arrived(&mut self, timestamp: u64) -> Result<(), TransitionError> {
        self.transition(EmergencyStatus::AtScene, timestamp)?;
        if self.arrived_at.is_none() {
            self.arrived_at = Some(timestamp);
        }
        Ok(())
    }

    /// Resolve the incident (AtScene → Completed). `completed_at` is set
    /// once.
    pub fn mark_completed(&mut self, timestamp: u64) -> Result<(), TransitionError> {
        self.transition(EmergencyStatus::Completed, timestamp)?;
        if self.completed_at.is_none() {
            self.completed_at = Some(timestamp);
        }
        Ok(())
    }

    /// Terminally decline the incident (Dispatched → Declined).
    pub fn mark_declined(&mut self, timestamp: u64) -> Result<(), TransitionError> {
        self.transition(EmergencyStatus::Declined, timestamp)
    }

    /// Withdraw the incident (Pending/Dispatched → Cancelled).
    pub fn mark_cancelled(&mut self, timestamp: u64) -> Result<(), TransitionError> {
        self.transition(EmergencyStatus::Cancelled, timestamp)
    }

    /// Record that `unit_id` declined this emergency, excluding it from
    /// future candidate searches for the record.
    pub fn record_decline(&mut self, unit_id: &str) {
        if !self.declined_by.iter().any(|id| id == unit_id) {
            self.declined_by.push(unit_id.to_string());
        }
    }

    fn guard_not_terminal(&self) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::AlreadyTerminal {
                state: self.status.as_str().to_string(),
            });
        }
        Ok(())
    }

    fn transition(
        &mut self,
        new_status: EmergencyStatus,
        timestamp: u64,
    ) -> Result<(), TransitionError> {
        self.guard_not_terminal()?;
        if !self.status.can_transition_to(new_status) {
            return Err(TransitionError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: new_status.as_str().to_string(),
            });
        }
        self.status = new_status;
        self.updated_at = timestamp;
        Ok(())
    }
}
