//! Assignment lifecycle handling.
//!
//! Once the engine pairs a unit with an emergency, the crew drives the
//! record through acknowledgement, arrival and completion, or hands it
//! back with a decline. Every operation here validates the pairing
//! first and commits its unit-side and emergency-side effects under a
//! single write guard.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use lifelink_core::{now_ms, AssignmentConfig};
use lifelink_domain::{DispatchEvent, EmergencyStatus, LocationReport, TransitionError};
use lifelink_geo::{Coordinate, Eta};
use lifelink_registry::{BoardState, DispatchBoard, RegistryError};

use crate::engine::{assumed_speed_kmh, nearest_available, Assignment, DispatchOutcome};
use crate::error::DispatchError;
use crate::feed::DispatchFeed;

/// Drives assignments from acknowledgement through completion.
pub struct LifecycleCoordinator {
    board: Arc<DispatchBoard>,
    feed: Arc<DispatchFeed>,
    config: AssignmentConfig,
}

impl LifecycleCoordinator {
    /// Create a coordinator over the shared board and feed.
    pub fn new(board: Arc<DispatchBoard>, feed: Arc<DispatchFeed>, config: AssignmentConfig) -> Self {
        Self {
            board,
            feed,
            config,
        }
    }

    /// The assigned unit acknowledges the dispatch and starts driving.
    pub async fn accept(&self, emergency_id: &str, unit_id: &str) -> Result<(), DispatchError> {
        let now = now_ms();
        {
            let mut state = self.board.write().await;
            require_assignment(&state, emergency_id, unit_id)?;
            state.emergencies.mark_en_route(emergency_id, now)?;
        }
        info!("Unit {} en route to {}", unit_id, emergency_id);
        self.feed.publish(DispatchEvent::UnitEnRoute {
            emergency_id: emergency_id.to_string(),
            unit_id: unit_id.to_string(),
            at: now,
        });
        Ok(())
    }

    /// The assigned unit reports on scene.
    ///
    /// `position` is the crew's GPS fix if one came with the report;
    /// without one the scene coordinates stand in, so the trail still
    /// shows the unit at the incident.
    pub async fn mark_arrival(
        &self,
        emergency_id: &str,
        unit_id: &str,
        position: Option<Coordinate>,
    ) -> Result<(), DispatchError> {
        let now = now_ms();
        {
            let mut state = self.board.write().await;
            require_assignment(&state, emergency_id, unit_id)?;
            let scene = state.emergencies.get(emergency_id)?.location;
            state.emergencies.mark_arrived(emergency_id, now)?;
            state.units.mark_at_scene(unit_id, now)?;
            let fix = position.unwrap_or(scene);
            state.units.update_location(unit_id, fix, LocationReport::at(now))?;
        }
        info!("Unit {} on scene at {}", unit_id, emergency_id);
        self.feed.publish(DispatchEvent::UnitArrived {
            emergency_id: emergency_id.to_string(),
            unit_id: unit_id.to_string(),
            at: now,
        });
        Ok(())
    }

    /// Close out the emergency and return the unit to the pool.
    pub async fn complete(&self, emergency_id: &str, unit_id: &str) -> Result<(), DispatchError> {
        let now = now_ms();
        {
            let mut state = self.board.write().await;
            require_assignment(&state, emergency_id, unit_id)?;
            state.emergencies.mark_completed(emergency_id, now)?;
            state.units.release(unit_id, now)?;
        }
        info!("Emergency {} completed by {}", emergency_id, unit_id);
        self.feed.publish(DispatchEvent::EmergencyCompleted {
            emergency_id: emergency_id.to_string(),
            unit_id: unit_id.to_string(),
            at: now,
        });
        Ok(())
    }

    /// The assigned unit turns the dispatch down before acknowledging.
    ///
    /// The unit goes back in the pool and the emergency is immediately
    /// re-ranked against the remaining candidates. With a replacement
    /// the record stays dispatched and swaps assignee in place; without
    /// one it reverts to pending. Decline is only open between
    /// assignment and acknowledgement.
    pub async fn decline(
        &self,
        emergency_id: &str,
        unit_id: &str,
    ) -> Result<DispatchOutcome, DispatchError> {
        let now = now_ms();
        let (outcome, events) = {
            let mut state = self.board.write().await;
            require_assignment(&state, emergency_id, unit_id)?;

            let record = state.emergencies.get(emergency_id)?;
            if !record.status.can_transition_to(EmergencyStatus::Pending) {
                return Err(decline_closed(record.status).into());
            }
            let scene = record.location;
            let priority = record.priority;

            state.units.release(unit_id, now)?;
            state.emergencies.record_decline(emergency_id, unit_id)?;

            let excluded: HashSet<String> = state
                .emergencies
                .get(emergency_id)?
                .declined_by
                .iter()
                .cloned()
                .collect();

            // Ranking under the write guard: the replacement claim
            // cannot lose a race here.
            match nearest_available(&state, scene, &excluded) {
                Some((next_id, distance_km)) => {
                    state.units.claim_for_dispatch(&next_id, emergency_id, now)?;
                    state.emergencies.reassign(emergency_id, &next_id, now)?;
                    let unit = state.units.get(&next_id)?;
                    let eta = Eta::estimate(distance_km, assumed_speed_kmh(&self.config, priority));
                    let assignment = Assignment {
                        emergency_id: emergency_id.to_string(),
                        unit_id: next_id.clone(),
                        unit_name: unit.display_name.clone(),
                        call_sign: unit.call_sign.clone(),
                        distance_km,
                        eta,
                    };
                    let events = vec![
                        DispatchEvent::UnitDeclined {
                            emergency_id: emergency_id.to_string(),
                            unit_id: unit_id.to_string(),
                            reassigned_to: Some(next_id),
                            at: now,
                        },
                        DispatchEvent::UnitAssigned {
                            emergency_id: emergency_id.to_string(),
                            unit_id: assignment.unit_id.clone(),
                            distance_km,
                            eta_minutes: assignment.eta.minutes,
                            at: now,
                        },
                    ];
                    (DispatchOutcome::Assigned(assignment), events)
                }
                None => {
                    state.emergencies.revert_to_pending(emergency_id, now)?;
                    let events = vec![DispatchEvent::UnitDeclined {
                        emergency_id: emergency_id.to_string(),
                        unit_id: unit_id.to_string(),
                        reassigned_to: None,
                        at: now,
                    }];
                    (
                        DispatchOutcome::Queued {
                            emergency_id: emergency_id.to_string(),
                        },
                        events,
                    )
                }
            }
        };

        match &outcome {
            DispatchOutcome::Assigned(assignment) => info!(
                "Unit {} declined {}; reassigned to {}",
                unit_id, emergency_id, assignment.unit_id
            ),
            DispatchOutcome::Queued { .. } => info!(
                "Unit {} declined {}; no replacement, back to pending",
                unit_id, emergency_id
            ),
        }
        for event in events {
            self.feed.publish(event);
        }
        Ok(outcome)
    }

    /// Operator cancellation, open while pending or dispatched.
    ///
    /// Releases the assigned unit, if any, in the same commit.
    pub async fn cancel(&self, emergency_id: &str) -> Result<(), DispatchError> {
        let now = now_ms();
        let released = {
            let mut state = self.board.write().await;
            let assigned = state.emergencies.get(emergency_id)?.assigned_unit_id.clone();
            state.emergencies.mark_cancelled(emergency_id, now)?;
            if let Some(unit_id) = &assigned {
                state.units.release(unit_id, now)?;
            }
            assigned
        };
        info!("Emergency {} cancelled", emergency_id);
        self.feed.publish(DispatchEvent::EmergencyCancelled {
            emergency_id: emergency_id.to_string(),
            released_unit_id: released,
            at: now,
        });
        Ok(())
    }
}

/// A lifecycle call is only valid from the unit the record is assigned
/// to; anything else looks like an unknown assignment to the caller.
fn require_assignment(
    state: &BoardState,
    emergency_id: &str,
    unit_id: &str,
) -> Result<(), RegistryError> {
    let record = state.emergencies.get(emergency_id)?;
    if record.assigned_unit_id.as_deref() != Some(unit_id) {
        return Err(RegistryError::EmergencyNotFound(emergency_id.to_string()));
    }
    Ok(())
}

fn decline_closed(status: EmergencyStatus) -> RegistryError {
    if status.is_terminal() {
        TransitionError::AlreadyTerminal {
            state: status.as_str().to_string(),
        }
        .into()
    } else {
        TransitionError::InvalidTransition {
            from: status.as_str().to_string(),
            to: EmergencyStatus::Pending.as_str().to_string(),
        }
        .into()
    }
}
