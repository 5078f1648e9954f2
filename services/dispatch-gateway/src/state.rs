use std::sync::Arc;

use lifelink_dispatch::{DispatchEngine, DispatchFeed, LifecycleCoordinator};
use lifelink_registry::DispatchBoard;

use crate::config::Config;

pub struct AppState {
    pub config: Config,
    pub board: Arc<DispatchBoard>,
    pub feed: Arc<DispatchFeed>,
    pub engine: DispatchEngine,
    pub lifecycle: LifecycleCoordinator,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let board = Arc::new(DispatchBoard::new(
            config.dispatch.tracking.location_history_depth,
        ));
        let feed = Arc::new(DispatchFeed::new(
            config.dispatch.feed.recent_capacity,
            config.dispatch.feed.channel_capacity,
        ));
        let engine = DispatchEngine::new(
            Arc::clone(&board),
            Arc::clone(&feed),
            config.dispatch.assignment.clone(),
        );
        let lifecycle = LifecycleCoordinator::new(
            Arc::clone(&board),
            Arc::clone(&feed),
            config.dispatch.assignment.clone(),
        );

        AppState {
            config,
            board,
            feed,
            engine,
            lifecycle,
        }
    }
}
