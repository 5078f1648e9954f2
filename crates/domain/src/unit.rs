//! Field unit records and the duty state machine.

use lifelink_geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TransitionError;

/// Duty states a field unit moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Signed off; never considered for assignment.
    OffDuty,
    /// On duty and eligible for dispatch.
    Available,
    /// Claimed by a dispatch and travelling to the scene.
    EnRoute,
    /// Working the assigned emergency on scene.
    AtScene,
}

impl UnitStatus {
    /// Wire form of the status, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::OffDuty => "off_duty",
            UnitStatus::Available => "available",
            UnitStatus::EnRoute => "en_route",
            UnitStatus::AtScene => "at_scene",
        }
    }

    /// Check if transition to new status is valid.
    pub fn can_transition_to(&self, new_status: UnitStatus) -> bool {
        match (self, new_status) {
            // Duty toggle
            (UnitStatus::OffDuty, UnitStatus::Available) => true,
            (UnitStatus::Available, UnitStatus::OffDuty) => true,
            // Claimed by the assignment engine
            (UnitStatus::Available, UnitStatus::EnRoute) => true,
            // Arrival on scene
            (UnitStatus::EnRoute, UnitStatus::AtScene) => true,
            // Released by decline or cancellation
            (UnitStatus::EnRoute, UnitStatus::Available) => true,
            // Released by completion
            (UnitStatus::AtScene, UnitStatus::Available) => true,
            _ => false,
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata accompanying a unit location report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    /// Horizontal accuracy of the fix in metres, when the device knows it.
    pub accuracy_m: Option<f64>,

    /// Ground speed in km/h, when reported.
    pub speed_kmh: Option<f64>,

    /// Heading in degrees clockwise from true north, when reported.
    pub heading_deg: Option<f64>,

    /// When the fix was taken (Unix epoch milliseconds).
    pub reported_at: u64,
}

impl LocationReport {
    /// A bare report carrying only its timestamp.
    pub fn at(reported_at: u64) -> Self {
        Self {
            accuracy_m: None,
            speed_kmh: None,
            heading_deg: None,
            reported_at,
        }
    }
}

/// One entry in a unit's recent movement trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Position of the fix.
    pub coordinate: Coordinate,

    /// Report metadata, including the fix timestamp.
    pub report: LocationReport,
}

/// A field response unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Stable unique identifier.
    pub id: String,

    /// Crew or operator name shown to dispatchers.
    pub display_name: String,

    /// Radio call sign, e.g. `AMB-101`.
    pub call_sign: String,

    /// Last known position; `None` until the unit first reports.
    pub location: Option<Coordinate>,

    /// Current duty status.
    pub status: UnitStatus,

    /// Emergency the unit is bound to; `Some` exactly while the unit is
    /// EnRoute or AtScene.
    pub active_emergency_id: Option<String>,

    /// Soft-delete flag; deactivated units are retained but never
    /// considered for assignment.
    pub active: bool,

    /// Metadata from the most recent location report.
    pub last_report: Option<LocationReport>,

    /// When the unit was registered (Unix epoch milliseconds).
    pub registered_at: u64,

    /// Timestamp of last mutation.
    pub last_updated: u64,
}

impl Unit {
    /// Create a new unit, off duty and with no known location.
    pub fn new(id: String, display_name: String, call_sign: String, timestamp: u64) -> Self {
        Self {
            id,
            display_name,
            call_sign,
            location: None,
            status: UnitStatus::OffDuty,
            active_emergency_id: None,
            active: true,
            last_report: None,
            registered_at: timestamp,
            last_updated: timestamp,
        }
    }

    /// True when the assignment engine may claim this unit: on duty,
    /// active, unassigned, and with a known position.
    pub fn can_accept_dispatch(&self) -> bool {
        self.active
            && self.status == UnitStatus::Available
            && self.active_emergency_id.is_none()
            && self.location.is_some()
    }

    /// Record a location report. Always succeeds: position updates are
    /// valid in every duty status.
    pub fn update_location(&mut self, coordinate: Coordinate, report: LocationReport) {
        self.location = Some(coordinate);
        self.last_updated = report.reported_at;
        self.last_report = Some(report);
    }

    /// Sign on for duty (OffDuty → Available).
    pub fn go_on_duty(&mut self, timestamp: u64) -> Result<(), TransitionError> {
        self.transition(UnitStatus::Available, timestamp)
    }

    /// Sign off duty (Available → OffDuty). Rejected with `UnitBusy`
    /// while bound to an emergency.
    pub fn go_off_duty(&mut self, timestamp: u64) -> Result<(), TransitionError> {
        if let Some(emergency_id) = &self.active_emergency_id {
            return Err(TransitionError::UnitBusy {
                unit_id: self.id.clone(),
                emergency_id: emergency_id.clone(),
            });
        }
        self.transition(UnitStatus::OffDuty, timestamp)
    }

    /// Bind the unit to an emergency (Available → EnRoute).
    ///
    /// This is the commit half of the engine's claim: the caller must
    /// re-check eligibility under its own exclusion discipline before
    /// invoking it.
    pub fn claim(&mut self, emergency_id: &str, timestamp: u64) -> Result<(), TransitionError> {
        if let Some(current) = &self.active_emergency_id {
            return Err(TransitionError::UnitBusy {
                unit_id: self.id.clone(),
                emergency_id: current.clone(),
            });
        }
        self.transition(UnitStatus::EnRoute, timestamp)?;
        self.active_emergency_id = Some(emergency_id.to_string());
        Ok(())
    }

    /// Record arrival on scene (EnRoute → AtScene).
    pub fn mark_at_scene(&mut self, timestamp: u64) -> Result<(), TransitionError> {
        self.transition(UnitStatus::AtScene, timestamp)
    }

    /// Release the unit back to the available pool (EnRoute/AtScene →
    /// Available), clearing its assignment.
    pub fn release(&mut self, timestamp: u64) -> Result<(), TransitionError> {
        self.transition(UnitStatus::Available, timestamp)?;
        self.active_emergency_id = None;
        Ok(())
    }

    /// Soft-delete the unit. Rejected with `UnitBusy` while bound to an
    /// emergency; otherwise the unit is signed off and flagged inactive.
    pub fn deactivate(&mut self, timestamp: u64) -> Result<(), TransitionError> {
        if let Some(emergency_id) = &self.active_emergency_id {
            return Err(TransitionError::UnitBusy {
                unit_id: self.id.clone(),
                emergency_id: emergency_id.clone(),
            });
        }
        self.active = false;
        self.status = UnitStatus::OffDuty;
        self.last_updated = timestamp;
        Ok(())
    }

    fn transition(&mut self, new_status: UnitStatus, timestamp: u64) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(new_status) {
            return Err(TransitionError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: new_status.as_str().to_string(),
            });
        }
        self.status = new_status;
        self.last_updated = timestamp;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Unit {
        Unit::new(
            "unit-001".to_string(),
            "Sam Okafor".to_string(),
            "AMB-101".to_string(),
            1000,
        )
    }

    #[test]
    fn test_unit_status_transitions() {
        // Valid transitions
        assert!(UnitStatus::OffDuty.can_transition_to(UnitStatus::Available));
        assert!(UnitStatus::Available.can_transition_to(UnitStatus::EnRoute));
        assert!(UnitStatus::EnRoute.can_transition_to(UnitStatus::AtScene));
        assert!(UnitStatus::EnRoute.can_transition_to(UnitStatus::Available));
        assert!(UnitStatus::AtScene.can_transition_to(UnitStatus::Available));

        // Invalid transitions
        assert!(!UnitStatus::OffDuty.can_transition_to(UnitStatus::EnRoute));
        assert!(!UnitStatus::Available.can_transition_to(UnitStatus::AtScene));
        assert!(!UnitStatus::AtScene.can_transition_to(UnitStatus::EnRoute));
        assert!(!UnitStatus::EnRoute.can_transition_to(UnitStatus::OffDuty));
    }

    #[test]
    fn test_status_wire_form() {
        assert_eq!(UnitStatus::EnRoute.as_str(), "en_route");
        assert_eq!(
            serde_json::to_string(&UnitStatus::AtScene).unwrap(),
            "\"at_scene\""
        );
    }

    #[test]
    fn test_new_unit_starts_off_duty() {
        let unit = unit();
        assert_eq!(unit.status, UnitStatus::OffDuty);
        assert!(unit.active);
        assert!(unit.location.is_none());
        assert!(!unit.can_accept_dispatch());
    }

    #[test]
    fn test_eligibility_needs_duty_and_location() {
        let mut unit = unit();
        unit.go_on_duty(2000).unwrap();
        assert!(!unit.can_accept_dispatch(), "no location yet");

        unit.update_location(Coordinate::new(40.7128, -74.0060), LocationReport::at(3000));
        assert!(unit.can_accept_dispatch());
        assert_eq!(unit.last_updated, 3000);
    }

    #[test]
    fn test_claim_binds_emergency() {
        let mut unit = unit();
        unit.go_on_duty(2000).unwrap();
        unit.update_location(Coordinate::new(40.7128, -74.0060), LocationReport::at(3000));

        unit.claim("EMG-1", 4000).unwrap();
        assert_eq!(unit.status, UnitStatus::EnRoute);
        assert_eq!(unit.active_emergency_id.as_deref(), Some("EMG-1"));

        // A second claim is busy, not an invalid transition.
        let err = unit.claim("EMG-2", 5000).unwrap_err();
        assert_eq!(
            err,
            TransitionError::UnitBusy {
                unit_id: "unit-001".to_string(),
                emergency_id: "EMG-1".to_string(),
            }
        );
    }

    #[test]
    fn test_claim_off_duty_rejected() {
        let mut unit = unit();
        let err = unit.claim("EMG-1", 2000).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: "off_duty".to_string(),
                to: "en_route".to_string(),
            }
        );
    }

    #[test]
    fn test_release_clears_assignment() {
        let mut unit = unit();
        unit.go_on_duty(2000).unwrap();
        unit.update_location(Coordinate::new(40.7128, -74.0060), LocationReport::at(3000));
        unit.claim("EMG-1", 4000).unwrap();
        unit.mark_at_scene(5000).unwrap();

        unit.release(6000).unwrap();
        assert_eq!(unit.status, UnitStatus::Available);
        assert!(unit.active_emergency_id.is_none());
        assert!(unit.can_accept_dispatch());
    }

    #[test]
    fn test_off_duty_while_assigned_is_busy() {
        let mut unit = unit();
        unit.go_on_duty(2000).unwrap();
        unit.update_location(Coordinate::new(40.7128, -74.0060), LocationReport::at(3000));
        unit.claim("EMG-1", 4000).unwrap();

        let err = unit.go_off_duty(5000).unwrap_err();
        assert!(matches!(err, TransitionError::UnitBusy { .. }));
        assert_eq!(unit.status, UnitStatus::EnRoute);
    }

    #[test]
    fn test_deactivate_signs_off() {
        let mut unit = unit();
        unit.go_on_duty(2000).unwrap();
        unit.deactivate(3000).unwrap();
        assert!(!unit.active);
        assert_eq!(unit.status, UnitStatus::OffDuty);
        assert!(!unit.can_accept_dispatch());
    }

    #[test]
    fn test_location_updates_valid_in_every_status() {
        let mut unit = unit();
        let p = Coordinate::new(40.7128, -74.0060);
        unit.update_location(p, LocationReport::at(2000));
        assert_eq!(unit.location, Some(p));

        unit.go_on_duty(3000).unwrap();
        unit.claim("EMG-1", 4000).unwrap();
        let q = Coordinate::new(40.72, -74.0);
        unit.update_location(q, LocationReport::at(5000));
        assert_eq!(unit.location, Some(q));
        assert_eq!(unit.status, UnitStatus::EnRoute, "status untouched");
    }
}
