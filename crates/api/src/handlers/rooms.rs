//! Perpetual room lobby + admin endpoints (components E.1/E.2, §4.E).
//!
//! The in-game question cycle itself is driven entirely by the background
//! scheduler (§4.E.1) and observed over the websocket in [`crate::handlers::ws`];
//! these handlers only cover lobby operations (discover a room, join/leave
//! as a spectator) and the admin manual-ops surface (§6 "Admin knobs").

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use adaptive_domain::{DomainError, PerpetualRoom, Spectator};

use crate::AppState;
use crate::middleware::auth::{AdminApiKey, AuthStudent};

#[derive(Debug, Serialize)]
pub struct RoomsResponse {
    pub rooms: Vec<PerpetualRoom>,
}

pub async fn featured_rooms(State(state): State<Arc<AppState>>) -> Result<Json<RoomsResponse>, DomainError> {
    let rooms = state.room_manager.get_featured_rooms().await?;
    Ok(Json(RoomsResponse { rooms }))
}

pub async fn room_by_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<PerpetualRoom>, DomainError> {
    state
        .room_manager
        .get_room_by_code(&code)
        .await?
        .map(Json)
        .ok_or_else(|| DomainError::NotFound(format!("room with code {code}")))
}

#[derive(Debug, Deserialize, Validate)]
pub struct JoinRoomBody {
    #[validate(length(min = 1, max = 40, message = "display_name must be 1-40 characters"))]
    pub display_name: String,
    #[validate(length(min = 1, message = "career must not be empty"))]
    pub career: String,
    #[serde(default)]
    pub auto_join_next: bool,
}

#[derive(Debug, Serialize)]
pub struct JoinRoomResponse {
    pub spectator_id: String,
}

/// Joins a room's lobby as a spectator. Promoted to a `SessionParticipant`
/// the next time `startNewGame` runs for this room (§4.E.2 `addSpectator`).
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    AuthStudent { student_id, .. }: AuthStudent,
    Json(body): Json<JoinRoomBody>,
) -> Result<Json<JoinRoomResponse>, DomainError> {
    body.validate().map_err(DomainError::from_validation_errors)?;

    let spectator = Spectator {
        id: Uuid::new_v4().to_string(),
        room_id,
        student_id,
        display_name: body.display_name,
        career: body.career,
        auto_join_next: body.auto_join_next,
        joined_at: Utc::now(),
    };
    let spectator_id = spectator.id.clone();
    state.room_manager.add_spectator(spectator).await?;
    Ok(Json(JoinRoomResponse { spectator_id }))
}

#[derive(Debug, Serialize)]
pub struct LeaveRoomResponse {
    pub left: bool,
}

pub async fn leave_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    AuthStudent { student_id, .. }: AuthStudent,
) -> Result<Json<LeaveRoomResponse>, DomainError> {
    state.room_manager.remove_spectator(&room_id, &student_id).await?;
    Ok(Json(LeaveRoomResponse { left: true }))
}

#[derive(Debug, Serialize)]
pub struct AdminOpResponse {
    pub ok: bool,
}

/// Manual admin ops (§4.E.1): `manualStart`, `pauseRoom`, `resumeRoom`,
/// `forceStop`. Gated behind the shared admin key, not student auth.
pub async fn manual_start(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    _admin: AdminApiKey,
) -> Result<Json<AdminOpResponse>, DomainError> {
    state.scheduler.manual_start(&room_id).await?;
    Ok(Json(AdminOpResponse { ok: true }))
}

pub async fn pause_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    _admin: AdminApiKey,
) -> Result<Json<AdminOpResponse>, DomainError> {
    state.scheduler.pause_room(&room_id).await?;
    Ok(Json(AdminOpResponse { ok: true }))
}

pub async fn resume_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    _admin: AdminApiKey,
) -> Result<Json<AdminOpResponse>, DomainError> {
    state.scheduler.resume_room(&room_id).await?;
    Ok(Json(AdminOpResponse { ok: true }))
}

pub async fn force_stop(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    _admin: AdminApiKey,
) -> Result<Json<AdminOpResponse>, DomainError> {
    state.scheduler.force_stop(&room_id).await?;
    Ok(Json(AdminOpResponse { ok: true }))
}

#[derive(Debug, Serialize)]
pub struct SchedulerHealthResponse {
    pub status: &'static str,
}

/// §4.E.1 health check: `healthy | degraded | unhealthy`.
pub async fn scheduler_health(State(state): State<Arc<AppState>>) -> Json<SchedulerHealthResponse> {
    use adaptive_game::HealthStatus;

    let status = match state.scheduler.health_check().await {
        HealthStatus::Healthy => "healthy",
        HealthStatus::Degraded => "degraded",
        HealthStatus::Unhealthy => "unhealthy",
    };
    Json(SchedulerHealthResponse { status })
}
