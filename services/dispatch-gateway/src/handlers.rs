use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use lifelink_core::now_ms;
use lifelink_domain::{DispatchEvent, IncidentDetails, LocationReport, Priority, Unit};
use lifelink_dispatch::{DispatchError, DispatchOutcome, EmergencyRequest};
use lifelink_geo::{Coordinate, GeoError};
use lifelink_registry::RegistryError;

use crate::state::AppState;

/// An error response with the upstream `{success: false, message}` body.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "message": self.message })),
        )
            .into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let status = match &err {
            RegistryError::UnitNotFound(_) | RegistryError::EmergencyNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            RegistryError::DuplicateUnit(_)
            | RegistryError::DuplicateEmergency(_)
            | RegistryError::UnitInactive(_)
            | RegistryError::ClaimConflict { .. }
            | RegistryError::Transition(_) => StatusCode::CONFLICT,
        };
        Self::new(status, err.to_string())
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::InvalidCoordinates { .. } => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            DispatchError::AssignmentConflict { .. } => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            DispatchError::Registry(inner) => inner.into(),
        }
    }
}

impl From<GeoError> for ApiError {
    fn from(err: GeoError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

#[derive(Deserialize)]
pub struct EmergencyPayload {
    patient_latitude: Option<f64>,
    patient_longitude: Option<f64>,
    patient_address: Option<String>,
    emergency_type: Option<String>,
    #[serde(default)]
    priority: Priority,
    caller_name: Option<String>,
    caller_phone: Option<String>,
    notes: Option<String>,
}

/// `POST /api/dispatch/emergencies` - the external emergency intake.
///
/// Credential check precedes body parsing, matching the upstream intake
/// contract: a caller without the shared key learns nothing about the
/// payload schema.
pub async fn create_emergency(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if presented != Some(state.config.api_key.as_str()) {
        warn!("Emergency report rejected: invalid or missing API key");
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Invalid or missing API key",
        ));
    }

    let payload: EmergencyPayload =
        serde_json::from_str(&body).map_err(|_| ApiError::bad_request("Invalid JSON body"))?;
    let (Some(latitude), Some(longitude)) = (payload.patient_latitude, payload.patient_longitude)
    else {
        return Err(ApiError::bad_request(
            "Patient latitude and longitude are required",
        ));
    };

    let request = EmergencyRequest {
        latitude,
        longitude,
        priority: payload.priority,
        details: IncidentDetails {
            address: payload.patient_address.clone(),
            category: payload.emergency_type,
            caller_name: payload.caller_name,
            caller_phone: payload.caller_phone,
            notes: payload.notes,
            metadata: Default::default(),
        },
    };

    match state.engine.create_emergency(request).await? {
        DispatchOutcome::Assigned(assignment) => Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Emergency dispatched successfully",
                "emergency_id": assignment.emergency_id,
                "assigned_unit": {
                    "unit_id": assignment.unit_id,
                    "name": assignment.unit_name,
                    "call_sign": assignment.call_sign,
                    "distance": format!("{:.2} km", assignment.distance_km),
                    "eta": assignment.eta.to_string(),
                },
                "patient_location": {
                    "latitude": latitude,
                    "longitude": longitude,
                    "address": payload.patient_address,
                },
            })),
        )),
        DispatchOutcome::Queued { emergency_id } => Ok((
            StatusCode::ACCEPTED,
            Json(json!({
                "success": true,
                "message": "Emergency logged. No units currently available.",
                "emergency_id": emergency_id,
                "status": "pending",
            })),
        )),
    }
}

#[derive(Deserialize)]
pub struct RegisterUnitPayload {
    unit_id: Option<String>,
    name: String,
    call_sign: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// `POST /api/units` - add a unit to the roster.
pub async fn register_unit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterUnitPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let now = now_ms();
    let unit_id = payload
        .unit_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("unit-{}", Uuid::new_v4()));

    let initial_fix = match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lon)) => Some(Coordinate::validated(lat, lon)?),
        _ => None,
    };

    let registered = {
        let mut board = state.board.write().await;
        board.units.register(Unit::new(
            unit_id.clone(),
            payload.name,
            payload.call_sign,
            now,
        ))?;
        if let Some(fix) = initial_fix {
            board
                .units
                .update_location(&unit_id, fix, LocationReport::at(now))?;
        }
        board.units.get(&unit_id)?.clone()
    };

    info!("Unit {} registered", unit_id);
    state.feed.publish(DispatchEvent::UnitRegistered {
        unit_id,
        at: now,
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "unit": registered })),
    ))
}

#[derive(Deserialize)]
pub struct LocationPayload {
    latitude: f64,
    longitude: f64,
    accuracy_m: Option<f64>,
    speed_kmh: Option<f64>,
    heading_deg: Option<f64>,
}

/// `POST /api/units/{id}/location` - periodic position report from a
/// unit's mobile client.
pub async fn report_location(
    State(state): State<Arc<AppState>>,
    Path(unit_id): Path<String>,
    Json(payload): Json<LocationPayload>,
) -> Result<Json<Value>, ApiError> {
    let fix = Coordinate::validated(payload.latitude, payload.longitude)?;
    let now = now_ms();
    let report = LocationReport {
        accuracy_m: payload.accuracy_m,
        speed_kmh: payload.speed_kmh,
        heading_deg: payload.heading_deg,
        reported_at: now,
    };

    state
        .board
        .write()
        .await
        .units
        .update_location(&unit_id, fix, report)?;

    state.feed.publish(DispatchEvent::UnitLocationUpdated {
        unit_id,
        latitude: fix.latitude,
        longitude: fix.longitude,
        at: now,
    });

    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct DutyPayload {
    on_duty: bool,
}

/// `POST /api/units/{id}/duty` - sign a unit on or off shift.
pub async fn set_duty(
    State(state): State<Arc<AppState>>,
    Path(unit_id): Path<String>,
    Json(payload): Json<DutyPayload>,
) -> Result<Json<Value>, ApiError> {
    let now = now_ms();
    let unit = {
        let mut board = state.board.write().await;
        board.units.set_duty(&unit_id, payload.on_duty, now)?;
        board.units.get(&unit_id)?.clone()
    };

    info!(
        "Unit {} signed {}",
        unit_id,
        if payload.on_duty { "on duty" } else { "off duty" }
    );
    state.feed.publish(DispatchEvent::UnitDutyChanged {
        unit_id,
        on_duty: payload.on_duty,
        at: now,
    });

    Ok(Json(json!({ "success": true, "unit": unit })))
}

/// `DELETE /api/units/{id}` - take a unit off the roster for good.
///
/// Soft delete: the record stays for history but the unit can no longer
/// sign on. Rejected while the unit holds an assignment.
pub async fn deactivate_unit(
    State(state): State<Arc<AppState>>,
    Path(unit_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let unit = {
        let mut board = state.board.write().await;
        board.units.deactivate(&unit_id, now_ms())?;
        board.units.get(&unit_id)?.clone()
    };
    info!("Unit {} deactivated", unit_id);
    Ok(Json(json!({ "success": true, "unit": unit })))
}

#[derive(Deserialize)]
pub struct UnitActionPayload {
    unit_id: String,
}

/// `POST /api/emergencies/{id}/accept` - the assigned crew acknowledges.
pub async fn accept_emergency(
    State(state): State<Arc<AppState>>,
    Path(emergency_id): Path<String>,
    Json(payload): Json<UnitActionPayload>,
) -> Result<Json<Value>, ApiError> {
    state
        .lifecycle
        .accept(&emergency_id, &payload.unit_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "emergency_id": emergency_id,
        "status": "en_route",
    })))
}

#[derive(Deserialize)]
pub struct ArrivalPayload {
    unit_id: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// `POST /api/emergencies/{id}/arrive` - the assigned crew reports on
/// scene, with an optional GPS fix.
pub async fn mark_arrival(
    State(state): State<Arc<AppState>>,
    Path(emergency_id): Path<String>,
    Json(payload): Json<ArrivalPayload>,
) -> Result<Json<Value>, ApiError> {
    let position = match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lon)) => Some(Coordinate::validated(lat, lon)?),
        _ => None,
    };

    state
        .lifecycle
        .mark_arrival(&emergency_id, &payload.unit_id, position)
        .await?;
    Ok(Json(json!({
        "success": true,
        "emergency_id": emergency_id,
        "status": "at_scene",
    })))
}

/// `POST /api/emergencies/{id}/complete` - close out the run.
pub async fn complete_emergency(
    State(state): State<Arc<AppState>>,
    Path(emergency_id): Path<String>,
    Json(payload): Json<UnitActionPayload>,
) -> Result<Json<Value>, ApiError> {
    state
        .lifecycle
        .complete(&emergency_id, &payload.unit_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "emergency_id": emergency_id,
        "status": "completed",
    })))
}

/// `POST /api/emergencies/{id}/decline` - the assigned crew turns the
/// run down; the engine immediately tries the next nearest unit.
pub async fn decline_emergency(
    State(state): State<Arc<AppState>>,
    Path(emergency_id): Path<String>,
    Json(payload): Json<UnitActionPayload>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state
        .lifecycle
        .decline(&emergency_id, &payload.unit_id)
        .await?;

    match outcome {
        DispatchOutcome::Assigned(assignment) => Ok(Json(json!({
            "success": true,
            "emergency_id": emergency_id,
            "status": "dispatched",
            "reassigned_to": {
                "unit_id": assignment.unit_id,
                "name": assignment.unit_name,
                "call_sign": assignment.call_sign,
                "distance": format!("{:.2} km", assignment.distance_km),
                "eta": assignment.eta.to_string(),
            },
        }))),
        DispatchOutcome::Queued { .. } => Ok(Json(json!({
            "success": true,
            "emergency_id": emergency_id,
            "status": "pending",
            "message": "No replacement unit available",
        }))),
    }
}

/// `POST /api/emergencies/{id}/cancel` - operator cancellation.
pub async fn cancel_emergency(
    State(state): State<Arc<AppState>>,
    Path(emergency_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.lifecycle.cancel(&emergency_id).await?;
    Ok(Json(json!({
        "success": true,
        "emergency_id": emergency_id,
        "status": "cancelled",
    })))
}

/// `POST /api/emergencies/{id}/redispatch` - operator retry for a
/// record that queued with no unit available.
pub async fn redispatch_emergency(
    State(state): State<Arc<AppState>>,
    Path(emergency_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    match state.engine.redispatch(&emergency_id).await? {
        DispatchOutcome::Assigned(assignment) => Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Emergency dispatched successfully",
                "emergency_id": assignment.emergency_id,
                "assigned_unit": {
                    "unit_id": assignment.unit_id,
                    "name": assignment.unit_name,
                    "call_sign": assignment.call_sign,
                    "distance": format!("{:.2} km", assignment.distance_km),
                    "eta": assignment.eta.to_string(),
                },
            })),
        )),
        DispatchOutcome::Queued { emergency_id } => Ok((
            StatusCode::ACCEPTED,
            Json(json!({
                "success": true,
                "message": "Emergency logged. No units currently available.",
                "emergency_id": emergency_id,
                "status": "pending",
            })),
        )),
    }
}

/// `GET /api/units` - the full roster.
pub async fn list_units(State(state): State<Arc<AppState>>) -> Json<Value> {
    let units = state.board.units_snapshot().await;
    Json(json!({ "count": units.len(), "units": units }))
}

/// `GET /api/units/{id}` - one unit with its recent movement trail.
pub async fn get_unit(
    State(state): State<Arc<AppState>>,
    Path(unit_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (unit, trail) = {
        let board = state.board.read().await;
        let unit = board.units.get(&unit_id)?.clone();
        let trail = board.units.trail(&unit_id)?;
        (unit, trail)
    };
    Ok(Json(json!({ "unit": unit, "trail": trail })))
}

#[derive(Deserialize)]
pub struct EmergencyQuery {
    active: Option<bool>,
}

/// `GET /api/emergencies` - the emergency log, newest first.
pub async fn list_emergencies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmergencyQuery>,
) -> Json<Value> {
    let emergencies = if query.active.unwrap_or(false) {
        state.board.active_emergencies().await
    } else {
        state.board.emergencies_snapshot().await
    };
    Json(json!({ "count": emergencies.len(), "emergencies": emergencies }))
}

/// `GET /api/emergencies/{id}` - one emergency record.
pub async fn get_emergency(
    State(state): State<Arc<AppState>>,
    Path(emergency_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = state
        .board
        .emergency_snapshot(&emergency_id)
        .await
        .ok_or_else(|| RegistryError::EmergencyNotFound(emergency_id.clone()))?;
    Ok(Json(json!({ "emergency": record })))
}

#[derive(Deserialize)]
pub struct FeedQuery {
    limit: Option<usize>,
}

/// `GET /api/feed/recent` - latest dispatch events, newest first.
pub async fn recent_feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Json<Value> {
    let events = state.feed.recent(query.limit.unwrap_or(50));
    Json(json!({ "count": events.len(), "events": events }))
}
