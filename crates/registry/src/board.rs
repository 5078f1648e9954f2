//! The shared dispatch board.

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use lifelink_domain::{Emergency, Unit};

use crate::emergencies::EmergencyStore;
use crate::units::UnitRegistry;

/// Everything the board guards: the unit roster and the emergency log.
#[derive(Debug)]
pub struct BoardState {
    /// The unit roster.
    pub units: UnitRegistry,
    /// The emergency log.
    pub emergencies: EmergencyStore,
}

/// The single synchronization point of the dispatch pipeline.
///
/// One `RwLock` covers both registries. Candidate ranking runs under a
/// read guard against a consistent snapshot; compound commits (claim a
/// unit *and* move the emergency, release *and* resolve) run under the
/// write guard so the pair of mutations becomes visible atomically.
/// Readers can never observe a dispatched emergency whose unit still
/// looks available, or the reverse.
///
/// Assignment commits serialize in write-lock acquisition order; no
/// fairness across emergencies beyond that.
#[derive(Debug)]
pub struct DispatchBoard {
    inner: RwLock<BoardState>,
}

impl DispatchBoard {
    /// Create a board with an empty roster and log. `trail_depth` bounds
    /// the per-unit location history.
    pub fn new(trail_depth: usize) -> Self {
        Self {
            inner: RwLock::new(BoardState {
                units: UnitRegistry::new(trail_depth),
                emergencies: EmergencyStore::new(),
            }),
        }
    }

    /// Acquire the shared read guard.
    pub async fn read(&self) -> RwLockReadGuard<'_, BoardState> {
        self.inner.read().await
    }

    /// Acquire the exclusive write guard.
    pub async fn write(&self) -> RwLockWriteGuard<'_, BoardState> {
        self.inner.write().await
    }

    /// Clone of one unit, if registered.
    pub async fn unit_snapshot(&self, unit_id: &str) -> Option<Unit> {
        self.read().await.units.get(unit_id).ok().cloned()
    }

    /// Clones of all units, ordered by id for stable presentation.
    pub async fn units_snapshot(&self) -> Vec<Unit> {
        let state = self.read().await;
        let mut units: Vec<Unit> = state.units.all().cloned().collect();
        units.sort_by(|a, b| a.id.cmp(&b.id));
        units
    }

    /// Clone of one emergency, if recorded.
    pub async fn emergency_snapshot(&self, emergency_id: &str) -> Option<Emergency> {
        self.read().await.emergencies.get(emergency_id).ok().cloned()
    }

    /// Clones of all emergencies, newest first.
    pub async fn emergencies_snapshot(&self) -> Vec<Emergency> {
        let state = self.read().await;
        let mut emergencies: Vec<Emergency> = state.emergencies.all().cloned().collect();
        emergencies.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        emergencies
    }

    /// Clones of non-terminal emergencies, newest first.
    pub async fn active_emergencies(&self) -> Vec<Emergency> {
        let state = self.read().await;
        let mut emergencies: Vec<Emergency> =
            state.emergencies.active().into_iter().cloned().collect();
        emergencies.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        emergencies
    }
}
