//! The assignment engine.
//!
//! Turns a reported emergency into a unit assignment: validate the scene,
//! log the record, rank available units by great-circle distance, and
//! commit the nearest claim. Ranking runs against a read snapshot; the
//! commit re-validates under the write lock, so a candidate lost to a
//! concurrent dispatch is retried against a fresh ranking instead of
//! being assigned twice.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use lifelink_core::{new_emergency_id, now_ms, AssignmentConfig};
use lifelink_domain::{
    DispatchEvent, Emergency, EmergencyStatus, IncidentDetails, Priority, TransitionError,
};
use lifelink_geo::{haversine_km, Coordinate, Eta};
use lifelink_registry::{BoardState, DispatchBoard, RegistryError};

use crate::error::DispatchError;
use crate::feed::DispatchFeed;

/// A reported emergency, as handed to the engine by the ingestion layer.
#[derive(Debug, Clone)]
pub struct EmergencyRequest {
    /// Scene latitude, degrees.
    pub latitude: f64,
    /// Scene longitude, degrees.
    pub longitude: f64,
    /// Reported severity.
    pub priority: Priority,
    /// Caller-supplied context, carried verbatim.
    pub details: IncidentDetails,
}

/// A committed unit assignment.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Emergency the unit was assigned to.
    pub emergency_id: String,
    /// Assigned unit.
    pub unit_id: String,
    /// Crew name, for the dispatch confirmation.
    pub unit_name: String,
    /// Radio call sign of the unit.
    pub call_sign: String,
    /// Great-circle distance from the unit to the scene, km.
    pub distance_km: f64,
    /// Estimated travel time at the priority's assumed speed.
    pub eta: Eta,
}

/// Result of an assignment attempt.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// A unit was claimed and the emergency dispatched.
    Assigned(Assignment),
    /// No eligible unit; the emergency is logged and stays pending.
    Queued {
        /// The pending emergency.
        emergency_id: String,
    },
}

impl DispatchOutcome {
    /// The emergency this outcome concerns.
    pub fn emergency_id(&self) -> &str {
        match self {
            DispatchOutcome::Assigned(assignment) => &assignment.emergency_id,
            DispatchOutcome::Queued { emergency_id } => emergency_id,
        }
    }

    /// True when a unit was assigned.
    pub fn is_assigned(&self) -> bool {
        matches!(self, DispatchOutcome::Assigned(_))
    }
}

/// Nearest claimable unit to `scene`, skipping `excluded` ids.
///
/// Distance is the haversine great-circle estimate; exact ties break
/// toward the lexicographically smaller unit id so selection is
/// deterministic. This is the ranking primitive of the engine, public
/// for operator "who would respond?" previews.
pub fn nearest_available(
    state: &BoardState,
    scene: Coordinate,
    excluded: &HashSet<String>,
) -> Option<(String, f64)> {
    state
        .units
        .list_available()
        .into_iter()
        .filter(|unit| !excluded.contains(&unit.id))
        .filter_map(|unit| {
            unit.location
                .map(|at| (unit.id.clone(), haversine_km(at, scene)))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
}

/// Assumed travel speed for a priority, km/h.
pub(crate) fn assumed_speed_kmh(config: &AssignmentConfig, priority: Priority) -> f64 {
    if priority.is_critical() {
        config.critical_speed_kmh
    } else {
        config.standard_speed_kmh
    }
}

/// The dispatch assignment engine.
pub struct DispatchEngine {
    board: Arc<DispatchBoard>,
    feed: Arc<DispatchFeed>,
    config: AssignmentConfig,
}

impl DispatchEngine {
    /// Create an engine over the shared board and feed.
    pub fn new(board: Arc<DispatchBoard>, feed: Arc<DispatchFeed>, config: AssignmentConfig) -> Self {
        Self {
            board,
            feed,
            config,
        }
    }

    /// Log a new emergency and dispatch the nearest available unit.
    ///
    /// An empty candidate pool is not an error: the emergency is recorded
    /// as pending and the outcome is [`DispatchOutcome::Queued`].
    pub async fn create_emergency(
        &self,
        request: EmergencyRequest,
    ) -> Result<DispatchOutcome, DispatchError> {
        let scene = Coordinate::validated(request.latitude, request.longitude)?;
        let priority = request.priority;
        let now = now_ms();

        let emergency_id = {
            let mut state = self.board.write().await;
            // The suffix space is large; regenerate on the rare collision.
            let mut id = new_emergency_id(now);
            while state.emergencies.contains(&id) {
                id = new_emergency_id(now);
            }
            let emergency = Emergency::new(id.clone(), scene, priority, request.details, now);
            state.emergencies.insert_pending(emergency)?;
            id
        };

        info!(
            "Emergency {} logged at ({}, {}) priority {}",
            emergency_id, scene.latitude, scene.longitude, priority
        );
        self.feed.publish(DispatchEvent::EmergencyReported {
            emergency_id: emergency_id.clone(),
            latitude: scene.latitude,
            longitude: scene.longitude,
            priority,
            at: now,
        });

        self.assign(&emergency_id, scene, priority).await
    }

    /// Re-run the assignment search for an emergency that is still
    /// pending (queued earlier, or reverted after a decline).
    pub async fn redispatch(&self, emergency_id: &str) -> Result<DispatchOutcome, DispatchError> {
        let (scene, priority) = {
            let state = self.board.read().await;
            let record = state.emergencies.get(emergency_id)?;
            if record.status != EmergencyStatus::Pending {
                return Err(pending_only(record.status).into());
            }
            (record.location, record.priority)
        };
        self.assign(emergency_id, scene, priority).await
    }

    /// The ranking/commit loop shared by creation and redispatch.
    async fn assign(
        &self,
        emergency_id: &str,
        scene: Coordinate,
        priority: Priority,
    ) -> Result<DispatchOutcome, DispatchError> {
        let speed_kmh = assumed_speed_kmh(&self.config, priority);
        let mut excluded: HashSet<String> = HashSet::new();
        let mut conflicts = 0u32;

        loop {
            let candidate = {
                let state = self.board.read().await;
                // Units that declined this record are never candidates
                // again, even if the decline landed mid-loop.
                let record = state.emergencies.get(emergency_id)?;
                for unit_id in &record.declined_by {
                    excluded.insert(unit_id.clone());
                }
                nearest_available(&state, scene, &excluded)
            };

            let Some((unit_id, distance_km)) = candidate else {
                let now = now_ms();
                info!("No eligible unit for {}; emergency queued", emergency_id);
                self.feed.publish(DispatchEvent::AssignmentQueued {
                    emergency_id: emergency_id.to_string(),
                    at: now,
                });
                return Ok(DispatchOutcome::Queued {
                    emergency_id: emergency_id.to_string(),
                });
            };

            let eta = Eta::estimate(distance_km, speed_kmh);
            match self.try_commit(emergency_id, &unit_id, distance_km, eta).await? {
                Some(assignment) => {
                    info!(
                        "Unit {} assigned to {} ({:.2} km, ETA {})",
                        assignment.unit_id, emergency_id, assignment.distance_km, assignment.eta
                    );
                    self.feed.publish(DispatchEvent::UnitAssigned {
                        emergency_id: assignment.emergency_id.clone(),
                        unit_id: assignment.unit_id.clone(),
                        distance_km: assignment.distance_km,
                        eta_minutes: assignment.eta.minutes,
                        at: now_ms(),
                    });
                    return Ok(DispatchOutcome::Assigned(assignment));
                }
                None => {
                    conflicts += 1;
                    if conflicts > self.config.max_assign_retries {
                        warn!(
                            "Assignment for {} abandoned after {} claim conflicts",
                            emergency_id, conflicts
                        );
                        return Err(DispatchError::AssignmentConflict {
                            emergency_id: emergency_id.to_string(),
                            conflicts,
                        });
                    }
                    // The snapshot was stale for this unit; re-rank
                    // without it.
                    excluded.insert(unit_id);
                }
            }
        }
    }

    /// Commit one claim under the write lock.
    ///
    /// `Ok(None)` means the candidate was taken by a concurrent dispatch
    /// between ranking and commit; the caller re-ranks. Both halves of
    /// the commit land under one guard, so readers see either the full
    /// assignment or none of it.
    async fn try_commit(
        &self,
        emergency_id: &str,
        unit_id: &str,
        distance_km: f64,
        eta: Eta,
    ) -> Result<Option<Assignment>, DispatchError> {
        let now = now_ms();
        let mut state = self.board.write().await;

        match state.units.claim_for_dispatch(unit_id, emergency_id, now) {
            Ok(()) => {}
            Err(RegistryError::ClaimConflict { .. }) => return Ok(None),
            Err(other) => return Err(other.into()),
        }

        if let Err(err) = state.emergencies.mark_dispatched(emergency_id, unit_id, now) {
            // The emergency moved while we ranked (cancelled, or already
            // dispatched elsewhere). Undo the claim before surfacing.
            state.units.release(unit_id, now)?;
            return Err(err.into());
        }

        let unit = state.units.get(unit_id)?;
        Ok(Some(Assignment {
            emergency_id: emergency_id.to_string(),
            unit_id: unit_id.to_string(),
            unit_name: unit.display_name.clone(),
            call_sign: unit.call_sign.clone(),
            distance_km,
            eta,
        }))
    }
}

fn pending_only(status: EmergencyStatus) -> RegistryError {
    if status.is_terminal() {
        TransitionError::AlreadyTerminal {
            state: status.as_str().to_string(),
        }
        .into()
    } else {
        TransitionError::InvalidTransition {
            from: status.as_str().to_string(),
            to: EmergencyStatus::Dispatched.as_str().to_string(),
        }
        .into()
    }
}
