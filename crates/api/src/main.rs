//! Adaptive Learning Orchestration Core — server entry point.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adaptive_api::{AppState, build_router};
use adaptive_config::AppConfig;
use adaptive_content::{
    DailyLearningContextManager, FallbackContentProvider, JustInTimeContentService,
    SessionStateManager,
};
use adaptive_game::{PerpetualRoomManager, PerpetualRoomScheduler, TokioBroadcastGateway};
use adaptive_journey::JourneyEngine;
use adaptive_mediator::{ContainerMediator, SubjectUnavailableNotifier};
use adaptive_skills::SkillClusterService;
use adaptive_storage::{
    PgDailyContextRepository, PgGameRepository, PgJourneyRepository, check_connection,
    create_pool, run_migrations,
};

/// Logs subjects the journey engine declined to offer (e.g. Grade 10 ELA)
/// instead of silently dropping them (§4.F step 1).
struct TracingSubjectUnavailableNotifier;

#[async_trait]
impl SubjectUnavailableNotifier for TracingSubjectUnavailableNotifier {
    async fn on_subject_unavailable(&self, user_id: &str, subject: &str) {
        tracing::info!(user_id, subject, "subject not offered at this student's grade");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Adaptive Learning Orchestration Core...");

    let config = AppConfig::from_env()?;
    tracing::info!("Binding to {}", config.bind_address);

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    check_connection(&pool).await?;
    tracing::info!("Database connection pool ready");

    let skills = Arc::new(SkillClusterService::new());

    let journey_repo = Arc::new(PgJourneyRepository::new(pool.clone()));
    let journey = Arc::new(JourneyEngine::new(journey_repo));

    let context_repo = Arc::new(PgDailyContextRepository::new(pool.clone()));
    let daily_context = Arc::new(DailyLearningContextManager::new(context_repo));

    let sessions = Arc::new(SessionStateManager::new());

    // No external LLM provider is wired into this deployment; the
    // deterministic fallback provider doubles as the primary generator
    // (§4.D.4 "On generator failure, fallback to FallbackContentProvider").
    let generator = Arc::new(FallbackContentProvider::new());
    let content = Arc::new(JustInTimeContentService::new(
        daily_context,
        sessions.clone(),
        generator,
        Duration::from_millis(config.content_generator_timeout_ms),
    ));

    let mediator = Arc::new(ContainerMediator::new(
        journey.clone(),
        content.clone(),
        sessions.clone(),
        Arc::new(TracingSubjectUnavailableNotifier),
    ));

    let game_repo = Arc::new(PgGameRepository::new(pool.clone()));
    let room_manager = Arc::new(PerpetualRoomManager::new(game_repo.clone()));
    let broadcaster = Arc::new(TokioBroadcastGateway::new());
    let scheduler = Arc::new(PerpetualRoomScheduler::new(
        game_repo,
        room_manager.clone(),
        broadcaster.clone(),
        Duration::from_millis(config.scheduler_tick_interval_ms),
    ));

    tokio::spawn(scheduler.clone().run());
    tracing::info!("Perpetual room scheduler ticking");

    let state = Arc::new(AppState {
        pool,
        config: config.clone(),
        start_time: Instant::now(),
        skills,
        journey,
        content,
        sessions,
        mediator,
        room_manager,
        scheduler,
        broadcaster,
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Server listening on {}", config.bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}
