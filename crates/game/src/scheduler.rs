use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use adaptive_domain::{DomainError, RoomStatus};
use chrono::Utc;
use dashmap::DashMap;
use tracing::{error, info, warn};

use crate::broadcast::RoomBroadcaster;
use crate::orchestrator::{self, GameOrchestrator, IncomingClick};
use crate::repository::GameRepository;
use crate::room_manager::PerpetualRoomManager;

/// §4.E.1 health check outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

const STUCK_INTERMISSION_MINUTES: i64 = 5;

type ClickSinkRegistry = Arc<DashMap<String, tokio::sync::mpsc::Sender<IncomingClick>>>;

/// §4.E.1 `PerpetualRoomScheduler`: a single long-lived tick loop that starts
/// games in rooms whose intermission has elapsed. Per-room game loops run as
/// independent spawned tasks so one room's failure never blocks the tick
/// (§8 "Errors in one room never halt processing of others").
pub struct PerpetualRoomScheduler {
    repo: Arc<dyn GameRepository>,
    room_manager: Arc<PerpetualRoomManager>,
    orchestrator: Arc<GameOrchestrator>,
    tick_interval: StdDuration,
    /// Prevents overlapping ticks (§8): a tick that is still running when the
    /// next one is due is skipped, not queued.
    tick_in_flight: AtomicBool,
    last_tick_completed_at: AtomicI64,
    last_tick_duration_ms: AtomicI64,
    click_sinks: ClickSinkRegistry,
}

impl PerpetualRoomScheduler {
    pub fn new(
        repo: Arc<dyn GameRepository>,
        room_manager: Arc<PerpetualRoomManager>,
        broadcaster: Arc<dyn RoomBroadcaster>,
        tick_interval: StdDuration,
    ) -> Self {
        let orchestrator = Arc::new(GameOrchestrator::new(
            repo.clone(),
            broadcaster,
            room_manager.clone(),
        ));
        Self {
            repo,
            room_manager,
            orchestrator,
            tick_interval,
            tick_in_flight: AtomicBool::new(false),
            last_tick_completed_at: AtomicI64::new(Utc::now().timestamp()),
            last_tick_duration_ms: AtomicI64::new(0),
            click_sinks: Arc::new(DashMap::new()),
        }
    }

    /// Runs the tick loop until the process shuts down. Intended to be
    /// `tokio::spawn`ed once from `main`.
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        loop {
            interval.tick().await;
            self.clone().tick().await;
        }
    }

    /// One scheduler tick. Public so tests and the admin surface can drive it
    /// directly without waiting on the interval.
    pub async fn tick(self: Arc<Self>) {
        if self
            .tick_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("scheduler tick skipped: previous tick still in flight");
            return;
        }

        let started = tokio::time::Instant::now();
        if let Err(err) = self.run_tick_body().await {
            error!(error = %err, "scheduler tick failed");
        }
        let elapsed = started.elapsed();

        self.last_tick_duration_ms
            .store(elapsed.as_millis() as i64, Ordering::Release);
        self.last_tick_completed_at
            .store(Utc::now().timestamp(), Ordering::Release);
        self.tick_in_flight.store(false, Ordering::Release);
    }

    async fn run_tick_body(&self) -> Result<(), DomainError> {
        let rooms = self.repo.list_active_rooms().await?;
        let now = Utc::now();

        for room in rooms {
            if room.status != RoomStatus::Intermission {
                continue;
            }
            let Some(next_starts_at) = room.next_game_starts_at else { continue };
            if next_starts_at > now {
                continue;
            }

            let room_id = room.id.clone();
            let room_manager = self.room_manager.clone();
            let orchestrator = self.orchestrator.clone();
            let click_sinks = self.click_sinks.clone();

            tokio::spawn(async move {
                if let Err(err) = start_game_for_room(&room_id, room_manager, orchestrator, click_sinks).await {
                    error!(room_id = %room_id, error = %err, "failed to start game for room");
                }
            });
        }

        Ok(())
    }

    /// Looks up the channel a websocket handler should forward a human click
    /// into for a running session, if one is registered.
    pub fn click_sink(&self, session_id: &str) -> Option<tokio::sync::mpsc::Sender<IncomingClick>> {
        self.click_sinks.get(session_id).map(|entry| entry.clone())
    }

    pub async fn manual_start(&self, room_id: &str) -> Result<(), DomainError> {
        start_game_for_room(
            room_id,
            self.room_manager.clone(),
            self.orchestrator.clone(),
            self.click_sinks.clone(),
        )
        .await
    }

    pub async fn pause_room(&self, room_id: &str) -> Result<(), DomainError> {
        self.room_manager.pause_room(room_id).await
    }

    pub async fn resume_room(&self, room_id: &str) -> Result<(), DomainError> {
        self.room_manager.resume_room(room_id).await
    }

    /// Forcibly ends whatever game is running in a room, dropping its click
    /// sink so late clicks have nowhere to land.
    pub async fn force_stop(&self, room_id: &str) -> Result<(), DomainError> {
        if let Some(room) = self.repo.get_room(room_id).await? {
            if let Some(session_id) = room.current_game_id {
                self.click_sinks.remove(&session_id);
            }
        }
        self.room_manager.pause_room(room_id).await
    }

    /// §4.E.1 health check: tick lag, DB connectivity, and rooms stuck past
    /// the 5-minute intermission threshold.
    pub async fn health_check(&self) -> HealthStatus {
        let lag_seconds = Utc::now().timestamp() - self.last_tick_completed_at.load(Ordering::Acquire);
        let tick_seconds = self.tick_interval.as_secs().max(1) as i64;

        let Ok(rooms) = self.repo.list_active_rooms().await else {
            return HealthStatus::Unhealthy;
        };

        if lag_seconds > tick_seconds * 10 {
            return HealthStatus::Unhealthy;
        }

        let stuck = rooms_stuck_in_intermission(&rooms);
        if stuck > 0 {
            warn!(count = stuck, "rooms stuck in intermission past threshold");
            return HealthStatus::Degraded;
        }
        if lag_seconds > tick_seconds * 3 {
            return HealthStatus::Degraded;
        }

        HealthStatus::Healthy
    }
}

fn rooms_stuck_in_intermission(rooms: &[adaptive_domain::PerpetualRoom]) -> usize {
    let now = Utc::now();
    rooms
        .iter()
        .filter(|room| room.status == RoomStatus::Intermission)
        .filter(|room| {
            room.next_game_starts_at
                .map(|at| now - at > chrono::Duration::minutes(STUCK_INTERMISSION_MINUTES))
                .unwrap_or(false)
        })
        .count()
}

async fn start_game_for_room(
    room_id: &str,
    room_manager: Arc<PerpetualRoomManager>,
    orchestrator: Arc<GameOrchestrator>,
    click_sinks: ClickSinkRegistry,
) -> Result<(), DomainError> {
    let (session, participants) = room_manager.start_new_game(room_id).await?;
    info!(room_id, session_id = %session.id, participants = participants.len(), "starting game");

    let room = room_manager
        .get_room(room_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("room {room_id}")))?;

    let (click_tx, click_rx) = orchestrator::new_click_channel();
    click_sinks.insert(session.id.clone(), click_tx.clone());

    let result = orchestrator
        .run_game(session.clone(), room, participants, click_tx, click_rx)
        .await;
    click_sinks.remove(&session.id);
    result.map(|_| ())
}
