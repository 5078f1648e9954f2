use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tracing::{error, info, warn};

use lifelink_core::{logging, EventJournal, JournalRecord};
use lifelink_domain::DispatchEvent;

mod config;
mod handlers;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = Config::from_env()?;
    let state = Arc::new(AppState::new(config.clone()));

    let journal = EventJournal::open(&config.journal_path)?;
    tokio::spawn(drain_to_journal(journal, state.feed.subscribe()));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/dispatch/emergencies", post(handlers::create_emergency))
        .route(
            "/api/units",
            post(handlers::register_unit).get(handlers::list_units),
        )
        .route(
            "/api/units/:id",
            get(handlers::get_unit).delete(handlers::deactivate_unit),
        )
        .route("/api/units/:id/location", post(handlers::report_location))
        .route("/api/units/:id/duty", post(handlers::set_duty))
        .route("/api/emergencies", get(handlers::list_emergencies))
        .route("/api/emergencies/:id", get(handlers::get_emergency))
        .route("/api/emergencies/:id/accept", post(handlers::accept_emergency))
        .route("/api/emergencies/:id/arrive", post(handlers::mark_arrival))
        .route(
            "/api/emergencies/:id/complete",
            post(handlers::complete_emergency),
        )
        .route(
            "/api/emergencies/:id/decline",
            post(handlers::decline_emergency),
        )
        .route("/api/emergencies/:id/cancel", post(handlers::cancel_emergency))
        .route(
            "/api/emergencies/:id/redispatch",
            post(handlers::redispatch_emergency),
        )
        .route("/api/feed/recent", get(handlers::recent_feed))
        .with_state(state)
        .layer(ServiceBuilder::new().into_inner());

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Dispatch gateway listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "dispatch-gateway",
        "timestamp": Utc::now().to_rfc3339()
    })))
}

/// Copy every feed event into the append-only audit journal.
///
/// The journal trails the live feed; a lagged receiver drops the oldest
/// events rather than stalling dispatch.
async fn drain_to_journal(
    mut journal: EventJournal,
    mut events: broadcast::Receiver<DispatchEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let record = JournalRecord {
                    recorded_at: event.occurred_at(),
                    kind: event.kind().to_string(),
                    emergency_id: event.emergency_id().map(str::to_string),
                    unit_id: event.unit_id().map(str::to_string),
                    payload: serde_json::to_string(&event).unwrap_or_default(),
                };
                if let Err(e) = journal.append(&record) {
                    error!("Journal append failed: {}", e);
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!("Journal writer lagged; {} events not recorded", missed);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
