//! Real-time broadcast wire events (§6). Payloads are plain JSON objects
//! keyed by field name, matching the shapes specified for the presentation
//! layer; the transport itself lives in the game crate's broadcast gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::BingoType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEvent {
    GameStarted {
        room_id: String,
        session_id: String,
        game_number: u32,
        participants: Vec<ParticipantSummary>,
    },
    QuestionStarted {
        room_id: String,
        question_number: u32,
        clue_text: String,
        skill_connection: String,
        career_code: String,
        time_limit_seconds: u32,
        started_at: DateTime<Utc>,
    },
    PlayerCorrect {
        room_id: String,
        participant_id: String,
        display_name: String,
        position: (u8, u8),
        response_time_seconds: f64,
        streak: u32,
        total_xp: u32,
    },
    PlayerIncorrect {
        room_id: String,
        participant_id: String,
        display_name: String,
        position: (u8, u8),
        response_time_seconds: f64,
    },
    BingoAchieved {
        room_id: String,
        participant_id: String,
        display_name: String,
        bingo_number: u32,
        bingo_type: BingoType,
        bingo_index: u8,
        slots_remaining: u32,
        xp_awarded: u32,
    },
    GameCompleted {
        room_id: String,
        game_number: u32,
        winners: Vec<LeaderboardEntry>,
        leaderboard: Vec<LeaderboardEntry>,
        next_game_starts_at: DateTime<Utc>,
        intermission_seconds: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: String,
    pub display_name: String,
    pub player_type: crate::game::PlayerType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub participant_id: String,
    pub display_name: String,
    pub bingos_won: u32,
    pub total_xp: u32,
    pub accuracy: f64,
    pub earliest_bingo_at: Option<DateTime<Utc>>,
}
