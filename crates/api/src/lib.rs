//! Adaptive Learning Orchestration Core — HTTP/WS surface.
//!
//! Thin axum bindings over the component crates: container lifecycle
//! (`adaptive-mediator`), journey queries (`adaptive-journey`), and the
//! multiplayer game's lobby/admin/broadcast surface (`adaptive-game`). All
//! business logic lives in those crates; handlers here only translate
//! requests and report errors via `DomainError`'s `IntoResponse` impl.

pub mod handlers;
pub mod middleware;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use adaptive_config::AppConfig;
use adaptive_content::{JustInTimeContentService, SessionStateManager};
use adaptive_game::{PerpetualRoomManager, PerpetualRoomScheduler, TokioBroadcastGateway};
use adaptive_journey::JourneyEngine;
use adaptive_mediator::ContainerMediator;
use adaptive_skills::SkillClusterService;

/// Application state shared across handlers. One instance per process
/// (§9 "Global state": stateful services are single-instance with explicit
/// init, not ambient module state).
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub start_time: Instant,

    pub skills: Arc<SkillClusterService>,
    pub journey: Arc<JourneyEngine>,
    pub content: Arc<JustInTimeContentService>,
    pub sessions: Arc<SessionStateManager>,
    pub mediator: Arc<ContainerMediator>,

    pub room_manager: Arc<PerpetualRoomManager>,
    pub scheduler: Arc<PerpetualRoomScheduler>,
    pub broadcaster: Arc<TokioBroadcastGateway>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(handlers::health::health))
        .route("/v1/ready", get(handlers::health::ready))
        // Container lifecycle (component F)
        .route("/v1/containers/enter", post(handlers::container::container_enter))
        .route("/v1/containers/complete", post(handlers::container::container_complete))
        .route("/v1/containers/cache/invalidate", post(handlers::container::invalidate_cache))
        .route("/v1/session/status", get(handlers::container::session_status))
        // Adaptive journey (component C)
        .route("/v1/journey/current-skill", get(handlers::journey::current_skill))
        .route("/v1/journey/assignments", get(handlers::journey::continuous_assignments))
        // Skill cluster reference data (component B)
        .route("/v1/skills/diagnostic-cluster", get(handlers::skills::diagnostic_cluster))
        .route("/v1/skills/{skill_id}", get(handlers::skills::get_skill))
        // Perpetual rooms lobby (component E)
        .route("/v1/rooms/featured", get(handlers::rooms::featured_rooms))
        .route("/v1/rooms/by-code/{code}", get(handlers::rooms::room_by_code))
        .route("/v1/rooms/{room_id}/spectate", post(handlers::rooms::join_room))
        .route("/v1/rooms/{room_id}/spectate", axum::routing::delete(handlers::rooms::leave_room))
        .route("/v1/rooms/{room_id}/ws", get(handlers::ws::room_socket))
        // Admin knobs (§6 "Admin knobs")
        .route("/v1/admin/rooms/{room_id}/start", post(handlers::rooms::manual_start))
        .route("/v1/admin/rooms/{room_id}/pause", post(handlers::rooms::pause_room))
        .route("/v1/admin/rooms/{room_id}/resume", post(handlers::rooms::resume_room))
        .route("/v1/admin/rooms/{room_id}/stop", post(handlers::rooms::force_stop))
        .route("/v1/admin/scheduler/health", get(handlers::rooms::scheduler_health))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        // TODO: Add rate limiting middleware (tower_governor or alternative)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
