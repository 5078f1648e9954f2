//! Shared fixtures for dispatch integration tests

use std::sync::Arc;

use lifelink_core::{now_ms, DispatchConfig};
use lifelink_dispatch::{
    DispatchEngine, DispatchFeed, EmergencyRequest, LifecycleCoordinator,
};
use lifelink_domain::{IncidentDetails, LocationReport, Priority, Unit};
use lifelink_geo::Coordinate;
use lifelink_registry::DispatchBoard;

/// A fully wired dispatch stack over one shared board.
pub struct DispatchHarness {
    pub board: Arc<DispatchBoard>,
    pub feed: Arc<DispatchFeed>,
    pub engine: Arc<DispatchEngine>,
    pub lifecycle: Arc<LifecycleCoordinator>,
}

impl DispatchHarness {
    /// Build a harness with the default tuning.
    pub fn new() -> Self {
        let config = DispatchConfig::default_config();
        let board = Arc::new(DispatchBoard::new(config.tracking.location_history_depth));
        let feed = Arc::new(DispatchFeed::new(
            config.feed.recent_capacity,
            config.feed.channel_capacity,
        ));
        let engine = Arc::new(DispatchEngine::new(
            Arc::clone(&board),
            Arc::clone(&feed),
            config.assignment.clone(),
        ));
        let lifecycle = Arc::new(LifecycleCoordinator::new(
            Arc::clone(&board),
            Arc::clone(&feed),
            config.assignment,
        ));
        Self {
            board,
            feed,
            engine,
            lifecycle,
        }
    }

    /// Register an on-duty unit at the given position.
    pub async fn add_ready_unit(&self, id: &str, latitude: f64, longitude: f64) {
        let now = now_ms();
        let mut unit = Unit::new(
            id.to_string(),
            format!("crew {id}"),
            format!("AMB-{id}"),
            now,
        );
        unit.go_on_duty(now).unwrap();
        unit.update_location(Coordinate::new(latitude, longitude), LocationReport::at(now));
        self.board.write().await.units.register(unit).unwrap();
    }
}

impl Default for DispatchHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A bare emergency request at the given scene.
pub fn request_at(latitude: f64, longitude: f64, priority: Priority) -> EmergencyRequest {
    EmergencyRequest {
        latitude,
        longitude,
        priority,
        details: IncidentDetails::default(),
    }
}
