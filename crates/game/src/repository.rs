use adaptive_domain::{
    CareerClue, ClickEvent, DomainError, GameSession, PerpetualRoom, SessionParticipant, Spectator,
};
use async_trait::async_trait;

/// Persistence boundary for the Game Orchestrator (§6 tables
/// `dl_perpetual_rooms`, `dl_game_sessions`, `dl_session_participants`,
/// `dl_spectators`, `dl_click_events`, `dl_clues`). Implemented against
/// Postgres in the storage crate; kept as a trait here so the scheduler,
/// room manager, and per-session loop can be exercised without a database.
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn get_room(&self, room_id: &str) -> Result<Option<PerpetualRoom>, DomainError>;
    async fn get_room_by_code(&self, room_code: &str) -> Result<Option<PerpetualRoom>, DomainError>;
    async fn list_active_rooms(&self) -> Result<Vec<PerpetualRoom>, DomainError>;
    async fn list_featured_rooms(&self) -> Result<Vec<PerpetualRoom>, DomainError>;
    async fn save_room(&self, room: &PerpetualRoom) -> Result<(), DomainError>;

    async fn create_session(&self, session: &GameSession) -> Result<(), DomainError>;
    async fn save_session(&self, session: &GameSession) -> Result<(), DomainError>;
    async fn get_session(&self, session_id: &str) -> Result<Option<GameSession>, DomainError>;
    /// Count of sessions ever created for a room, used to assign the next
    /// `game_number` (§3 GameSession).
    async fn count_sessions_for_room(&self, room_id: &str) -> Result<u32, DomainError>;

    async fn save_participant(&self, participant: &SessionParticipant) -> Result<(), DomainError>;
    async fn list_participants(
        &self,
        session_id: &str,
    ) -> Result<Vec<SessionParticipant>, DomainError>;

    async fn append_click(&self, click: &ClickEvent) -> Result<(), DomainError>;

    async fn list_spectators(&self, room_id: &str) -> Result<Vec<Spectator>, DomainError>;
    async fn add_spectator(&self, spectator: &Spectator) -> Result<(), DomainError>;
    async fn remove_spectator(&self, room_id: &str, student_id: &str) -> Result<(), DomainError>;

    async fn clues_for_grade(&self, grade_category: &str) -> Result<Vec<CareerClue>, DomainError>;

    /// Optimistic decrement of `bingo_slots_remaining`, conditional on the
    /// caller's last-observed value (§5 "Shared resource policy": the
    /// decrement must be conditional on the prior value). Returns `true` if
    /// this caller won the race, `false` if another participant's claim
    /// already moved the counter — the caller must treat its own click as a
    /// normal correct answer with no bingo slot in that case.
    async fn try_decrement_bingo_slot(
        &self,
        session_id: &str,
        expected_remaining: u32,
    ) -> Result<bool, DomainError>;
}
