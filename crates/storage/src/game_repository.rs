//! Postgres-backed `GameRepository` (§4.E, §6) -- the Game Orchestrator's
//! persistence boundary over `dl_perpetual_rooms`, `dl_game_sessions`,
//! `dl_session_participants`, `dl_spectators`, `dl_click_events`, and
//! `dl_clues`.
//!
//! Enum columns (`status`, `player_type`, `ai_difficulty`, `bingo_type`) are
//! stored as `text`, serialized through the domain type's own `Serialize`
//! impl rather than a hand-maintained string table -- the wire
//! representation and the storage representation can never drift apart.
//! Nested, wholly-owned structures (`bingo_card`, `unlocked_positions`,
//! `completed_lines`, `bingo_winners`, `questions_asked`,
//! `distractor_careers`, a click's `position`) are `jsonb` via
//! `sqlx::types::Json`, matching the teacher's own use of JSON columns for
//! this kind of per-row nested data.

use adaptive_domain::{
    AiDifficulty, BingoWinner, CareerClue, ClickEvent, DomainError, GameSession, GameStatus,
    PerpetualRoom, PlayerType, Position, RoomStatus, SessionParticipant, Spectator,
};
use adaptive_game::GameRepository;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::PgPool;
use sqlx::types::Json;

fn to_text<T: Serialize>(value: &T) -> Result<String, DomainError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => Ok(s),
        _ => Err(DomainError::Database("enum serialization did not produce a string".into())),
    }
}

fn from_text<T: DeserializeOwned>(raw: &str) -> Result<T, DomainError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|e| DomainError::Database(e.to_string()))
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: String,
    room_code: String,
    room_name: String,
    grade_category: String,
    max_players_per_game: i32,
    bingo_slots_per_game: i32,
    question_time_limit_seconds: i32,
    intermission_duration_seconds: i32,
    status: String,
    current_game_id: Option<String>,
    next_game_starts_at: Option<chrono::DateTime<chrono::Utc>>,
    is_active: bool,
    is_featured: bool,
}

impl RoomRow {
    fn into_domain(self) -> Result<PerpetualRoom, DomainError> {
        Ok(PerpetualRoom {
            id: self.id,
            room_code: self.room_code,
            room_name: self.room_name,
            grade_category: self.grade_category,
            max_players_per_game: self.max_players_per_game as u32,
            bingo_slots_per_game: self.bingo_slots_per_game as u32,
            question_time_limit_seconds: self.question_time_limit_seconds as u32,
            intermission_duration_seconds: self.intermission_duration_seconds as u32,
            status: from_text::<RoomStatus>(&self.status)?,
            current_game_id: self.current_game_id,
            next_game_starts_at: self.next_game_starts_at,
            is_active: self.is_active,
            is_featured: self.is_featured,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    room_id: String,
    game_number: i32,
    status: String,
    bingo_slots_total: i32,
    bingo_slots_remaining: i32,
    bingo_winners: Json<Vec<BingoWinner>>,
    questions_asked: Json<Vec<String>>,
    current_question_number: i32,
    started_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    duration_seconds: Option<i32>,
}

impl SessionRow {
    fn into_domain(self) -> Result<GameSession, DomainError> {
        Ok(GameSession {
            id: self.id,
            room_id: self.room_id,
            game_number: self.game_number as u32,
            status: from_text::<GameStatus>(&self.status)?,
            bingo_slots_total: self.bingo_slots_total as u32,
            bingo_slots_remaining: self.bingo_slots_remaining as u32,
            bingo_winners: self.bingo_winners.0,
            questions_asked: self.questions_asked.0,
            current_question_number: self.current_question_number as u32,
            started_at: self.started_at,
            completed_at: self.completed_at,
            duration_seconds: self.duration_seconds.map(|d| d as u32),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    id: String,
    session_id: String,
    player_type: String,
    display_name: String,
    student_id: Option<String>,
    ai_difficulty: Option<String>,
    bingo_card: Json<Vec<Vec<String>>>,
    unlocked_positions: Json<Vec<Position>>,
    completed_rows: Json<Vec<u8>>,
    completed_cols: Json<Vec<u8>>,
    completed_diagonals: Json<Vec<u8>>,
    correct_answers: i32,
    incorrect_answers: i32,
    current_streak: i32,
    max_streak: i32,
    total_xp: i32,
    bingos_won: i32,
    is_active: bool,
    is_connected: bool,
    earliest_bingo_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ParticipantRow {
    fn into_domain(self) -> Result<SessionParticipant, DomainError> {
        let mut bingo_card: adaptive_domain::BingoCard = Default::default();
        for (row_idx, row) in self.bingo_card.0.into_iter().enumerate().take(5) {
            for (col_idx, cell) in row.into_iter().enumerate().take(5) {
                bingo_card[row_idx][col_idx] = cell;
            }
        }

        Ok(SessionParticipant {
            id: self.id,
            session_id: self.session_id,
            player_type: from_text::<PlayerType>(&self.player_type)?,
            display_name: self.display_name,
            student_id: self.student_id,
            ai_difficulty: self
                .ai_difficulty
                .as_deref()
                .map(from_text::<AiDifficulty>)
                .transpose()?,
            bingo_card,
            unlocked_positions: self.unlocked_positions.0.into_iter().collect(),
            completed_lines: adaptive_domain::CompletedLines {
                rows: self.completed_rows.0.into_iter().collect(),
                cols: self.completed_cols.0.into_iter().collect(),
                diagonals: self.completed_diagonals.0.into_iter().collect(),
            },
            correct_answers: self.correct_answers as u32,
            incorrect_answers: self.incorrect_answers as u32,
            current_streak: self.current_streak as u32,
            max_streak: self.max_streak as u32,
            total_xp: self.total_xp as u32,
            bingos_won: self.bingos_won as u32,
            is_active: self.is_active,
            is_connected: self.is_connected,
            earliest_bingo_at: self.earliest_bingo_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SpectatorRow {
    id: String,
    room_id: String,
    student_id: String,
    display_name: String,
    career: String,
    auto_join_next: bool,
    joined_at: chrono::DateTime<chrono::Utc>,
}

impl From<SpectatorRow> for Spectator {
    fn from(row: SpectatorRow) -> Self {
        Spectator {
            id: row.id,
            room_id: row.room_id,
            student_id: row.student_id,
            display_name: row.display_name,
            career: row.career,
            auto_join_next: row.auto_join_next,
            joined_at: row.joined_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClueRow {
    id: String,
    career_code: String,
    clue_text: String,
    skill_connection: String,
    difficulty: String,
    grade_category: String,
    distractor_careers: Json<Vec<String>>,
}

impl From<ClueRow> for CareerClue {
    fn from(row: ClueRow) -> Self {
        CareerClue {
            id: row.id,
            career_code: row.career_code,
            clue_text: row.clue_text,
            skill_connection: row.skill_connection,
            difficulty: row.difficulty,
            grade_category: row.grade_category,
            distractor_careers: row.distractor_careers.0,
        }
    }
}

#[derive(Clone)]
pub struct PgGameRepository {
    pool: PgPool,
}

impl PgGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ROOM_COLUMNS: &str = "id, room_code, room_name, grade_category, max_players_per_game, \
    bingo_slots_per_game, question_time_limit_seconds, intermission_duration_seconds, status, \
    current_game_id, next_game_starts_at, is_active, is_featured";

const SESSION_COLUMNS: &str = "id, room_id, game_number, status, bingo_slots_total, \
    bingo_slots_remaining, bingo_winners, questions_asked, current_question_number, started_at, \
    completed_at, duration_seconds";

const PARTICIPANT_COLUMNS: &str = "id, session_id, player_type, display_name, student_id, \
    ai_difficulty, bingo_card, unlocked_positions, completed_rows, completed_cols, \
    completed_diagonals, correct_answers, incorrect_answers, current_streak, max_streak, \
    total_xp, bingos_won, is_active, is_connected, earliest_bingo_at";

#[async_trait]
impl GameRepository for PgGameRepository {
    async fn get_room(&self, room_id: &str) -> Result<Option<PerpetualRoom>, DomainError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM dl_perpetual_rooms WHERE id = $1"
        ))
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RoomRow::into_domain).transpose()
    }

    async fn get_room_by_code(&self, room_code: &str) -> Result<Option<PerpetualRoom>, DomainError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM dl_perpetual_rooms WHERE room_code = $1"
        ))
        .bind(room_code)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RoomRow::into_domain).transpose()
    }

    async fn list_active_rooms(&self) -> Result<Vec<PerpetualRoom>, DomainError> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM dl_perpetual_rooms WHERE is_active = true"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RoomRow::into_domain).collect()
    }

    async fn list_featured_rooms(&self) -> Result<Vec<PerpetualRoom>, DomainError> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM dl_perpetual_rooms WHERE is_featured = true AND is_active = true"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RoomRow::into_domain).collect()
    }

    async fn save_room(&self, room: &PerpetualRoom) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO dl_perpetual_rooms
                (id, room_code, room_name, grade_category, max_players_per_game,
                 bingo_slots_per_game, question_time_limit_seconds,
                 intermission_duration_seconds, status, current_game_id,
                 next_game_starts_at, is_active, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                current_game_id = EXCLUDED.current_game_id,
                next_game_starts_at = EXCLUDED.next_game_starts_at,
                is_active = EXCLUDED.is_active,
                is_featured = EXCLUDED.is_featured
            "#,
        )
        .bind(&room.id)
        .bind(&room.room_code)
        .bind(&room.room_name)
        .bind(&room.grade_category)
        .bind(room.max_players_per_game as i32)
        .bind(room.bingo_slots_per_game as i32)
        .bind(room.question_time_limit_seconds as i32)
        .bind(room.intermission_duration_seconds as i32)
        .bind(to_text(&room.status)?)
        .bind(&room.current_game_id)
        .bind(room.next_game_starts_at)
        .bind(room.is_active)
        .bind(room.is_featured)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_session(&self, session: &GameSession) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO dl_game_sessions ({SESSION_COLUMNS}) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)"
        ))
        .bind(&session.id)
        .bind(&session.room_id)
        .bind(session.game_number as i32)
        .bind(to_text(&session.status)?)
        .bind(session.bingo_slots_total as i32)
        .bind(session.bingo_slots_remaining as i32)
        .bind(Json(&session.bingo_winners))
        .bind(Json(&session.questions_asked))
        .bind(session.current_question_number as i32)
        .bind(session.started_at)
        .bind(session.completed_at)
        .bind(session.duration_seconds.map(|d| d as i32))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_session(&self, session: &GameSession) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE dl_game_sessions SET
                status = $2, bingo_slots_remaining = $3, bingo_winners = $4,
                questions_asked = $5, current_question_number = $6,
                completed_at = $7, duration_seconds = $8
            WHERE id = $1
            "#,
        )
        .bind(&session.id)
        .bind(to_text(&session.status)?)
        .bind(session.bingo_slots_remaining as i32)
        .bind(Json(&session.bingo_winners))
        .bind(Json(&session.questions_asked))
        .bind(session.current_question_number as i32)
        .bind(session.completed_at)
        .bind(session.duration_seconds.map(|d| d as i32))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<GameSession>, DomainError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM dl_game_sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(SessionRow::into_domain).transpose()
    }

    async fn count_sessions_for_room(&self, room_id: &str) -> Result<u32, DomainError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM dl_game_sessions WHERE room_id = $1",
        )
        .bind(room_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u32)
    }

    async fn save_participant(&self, participant: &SessionParticipant) -> Result<(), DomainError> {
        let bingo_card: Vec<Vec<String>> = participant.bingo_card.iter().map(|row| row.to_vec()).collect();
        let unlocked: Vec<Position> = participant.unlocked_positions.iter().copied().collect();
        let rows: Vec<u8> = participant.completed_lines.rows.iter().copied().collect();
        let cols: Vec<u8> = participant.completed_lines.cols.iter().copied().collect();
        let diagonals: Vec<u8> = participant.completed_lines.diagonals.iter().copied().collect();

        sqlx::query(&format!(
            r#"
            INSERT INTO dl_session_participants ({PARTICIPANT_COLUMNS})
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20)
            ON CONFLICT (id) DO UPDATE SET
                unlocked_positions = EXCLUDED.unlocked_positions,
                completed_rows = EXCLUDED.completed_rows,
                completed_cols = EXCLUDED.completed_cols,
                completed_diagonals = EXCLUDED.completed_diagonals,
                correct_answers = EXCLUDED.correct_answers,
                incorrect_answers = EXCLUDED.incorrect_answers,
                current_streak = EXCLUDED.current_streak,
                max_streak = EXCLUDED.max_streak,
                total_xp = EXCLUDED.total_xp,
                bingos_won = EXCLUDED.bingos_won,
                is_active = EXCLUDED.is_active,
                is_connected = EXCLUDED.is_connected,
                earliest_bingo_at = EXCLUDED.earliest_bingo_at
            "#
        ))
        .bind(&participant.id)
        .bind(&participant.session_id)
        .bind(to_text(&participant.player_type)?)
        .bind(&participant.display_name)
        .bind(&participant.student_id)
        .bind(participant.ai_difficulty.map(|d| to_text(&d)).transpose()?)
        .bind(Json(bingo_card))
        .bind(Json(unlocked))
        .bind(Json(rows))
        .bind(Json(cols))
        .bind(Json(diagonals))
        .bind(participant.correct_answers as i32)
        .bind(participant.incorrect_answers as i32)
        .bind(participant.current_streak as i32)
        .bind(participant.max_streak as i32)
        .bind(participant.total_xp as i32)
        .bind(participant.bingos_won as i32)
        .bind(participant.is_active)
        .bind(participant.is_connected)
        .bind(participant.earliest_bingo_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_participants(&self, session_id: &str) -> Result<Vec<SessionParticipant>, DomainError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM dl_session_participants WHERE session_id = $1"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ParticipantRow::into_domain).collect()
    }

    async fn append_click(&self, click: &ClickEvent) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO dl_click_events
                (id, session_id, participant_id, clue_id, question_number, position,
                 is_correct, response_time_seconds, new_bingo_achieved, xp_earned,
                 question_started_at, answered_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            "#,
        )
        .bind(&click.id)
        .bind(&click.session_id)
        .bind(&click.participant_id)
        .bind(&click.clue_id)
        .bind(click.question_number as i32)
        .bind(Json(click.position))
        .bind(click.is_correct)
        .bind(click.response_time_seconds)
        .bind(click.new_bingo_achieved)
        .bind(click.xp_earned as i32)
        .bind(click.question_started_at)
        .bind(click.answered_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_spectators(&self, room_id: &str) -> Result<Vec<Spectator>, DomainError> {
        let rows = sqlx::query_as::<_, SpectatorRow>(
            "SELECT id, room_id, student_id, display_name, career, auto_join_next, joined_at \
             FROM dl_spectators WHERE room_id = $1",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Spectator::from).collect())
    }

    async fn add_spectator(&self, spectator: &Spectator) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO dl_spectators (id, room_id, student_id, display_name, career, auto_join_next, joined_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&spectator.id)
        .bind(&spectator.room_id)
        .bind(&spectator.student_id)
        .bind(&spectator.display_name)
        .bind(&spectator.career)
        .bind(spectator.auto_join_next)
        .bind(spectator.joined_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_spectator(&self, room_id: &str, student_id: &str) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM dl_spectators WHERE room_id = $1 AND student_id = $2")
            .bind(room_id)
            .bind(student_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clues_for_grade(&self, grade_category: &str) -> Result<Vec<CareerClue>, DomainError> {
        let rows = sqlx::query_as::<_, ClueRow>(
            "SELECT id, career_code, clue_text, skill_connection, difficulty, grade_category, \
             distractor_careers FROM dl_clues WHERE grade_category = $1",
        )
        .bind(grade_category)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CareerClue::from).collect())
    }

    /// §5 "Shared resource policy": conditional decrement on the prior
    /// observed value. A zero-row update means another participant's claim
    /// already moved the counter.
    async fn try_decrement_bingo_slot(
        &self,
        session_id: &str,
        expected_remaining: u32,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE dl_game_sessions
            SET bingo_slots_remaining = bingo_slots_remaining - 1
            WHERE id = $1 AND bingo_slots_remaining = $2 AND bingo_slots_remaining > 0
            "#,
        )
        .bind(session_id)
        .bind(expected_remaining as i32)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
