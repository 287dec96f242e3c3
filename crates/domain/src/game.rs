//! Multiplayer bingo game types (§3, §4.E).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Active,
    Intermission,
    Paused,
}

/// A long-lived multiplayer room that continuously cycles games and
/// intermissions. Never destroyed in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerpetualRoom {
    pub id: String,
    pub room_code: String,
    pub room_name: String,
    pub grade_category: String,
    pub max_players_per_game: u32,
    pub bingo_slots_per_game: u32,
    pub question_time_limit_seconds: u32,
    pub intermission_duration_seconds: u32,
    pub status: RoomStatus,
    pub current_game_id: Option<String>,
    pub next_game_starts_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_featured: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BingoType {
    Row,
    Col,
    Diag,
}

/// A completed bingo line, identified by type and index (row/col number, or
/// 0/1 for the two diagonals).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BingoLine {
    pub bingo_type: BingoType,
    pub bingo_index: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BingoWinner {
    pub participant_id: String,
    pub bingo_type: BingoType,
    pub bingo_index: u8,
    pub achieved_at: DateTime<Utc>,
    pub xp_awarded: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub id: String,
    pub room_id: String,
    pub game_number: u32,
    pub status: GameStatus,
    pub bingo_slots_total: u32,
    pub bingo_slots_remaining: u32,
    pub bingo_winners: Vec<BingoWinner>,
    pub questions_asked: Vec<String>,
    pub current_question_number: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u32>,
}

impl GameSession {
    /// `bingoSlotsTotal = clamp(ceil(playerCount/2), 2, 6)` (§3).
    pub fn bingo_slots_for_player_count(player_count: u32) -> u32 {
        let raw = player_count.div_ceil(2);
        raw.clamp(2, 6)
    }

    pub const MAX_QUESTIONS: u32 = 20;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerType {
    Human,
    Ai,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AiDifficulty {
    QuickBot,
    SteadyBot,
    ThinkBot,
    ExpertBot,
}

impl AiDifficulty {
    /// `(accuracy, response_time_mean_seconds, response_time_stddev_seconds)` (§4.E.3).
    pub fn params(self) -> (f64, f64, f64) {
        match self {
            AiDifficulty::QuickBot => (0.60, 2.5, 1.0),
            AiDifficulty::SteadyBot => (0.75, 4.0, 1.5),
            AiDifficulty::ThinkBot => (0.90, 6.0, 2.0),
            AiDifficulty::ExpertBot => (0.95, 3.0, 1.0),
        }
    }
}

pub type BingoCard = [[String; 5]; 5];
pub type Position = (u8, u8);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletedLines {
    pub rows: HashSet<u8>,
    pub cols: HashSet<u8>,
    pub diagonals: HashSet<u8>,
}

impl CompletedLines {
    pub fn contains(&self, line: &BingoLine) -> bool {
        match line.bingo_type {
            BingoType::Row => self.rows.contains(&line.bingo_index),
            BingoType::Col => self.cols.contains(&line.bingo_index),
            BingoType::Diag => self.diagonals.contains(&line.bingo_index),
        }
    }

    pub fn insert(&mut self, line: BingoLine) {
        match line.bingo_type {
            BingoType::Row => self.rows.insert(line.bingo_index),
            BingoType::Col => self.cols.insert(line.bingo_index),
            BingoType::Diag => self.diagonals.insert(line.bingo_index),
        };
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParticipant {
    pub id: String,
    pub session_id: String,
    pub player_type: PlayerType,
    pub display_name: String,
    pub student_id: Option<String>,
    pub ai_difficulty: Option<AiDifficulty>,
    pub bingo_card: BingoCard,
    pub unlocked_positions: HashSet<Position>,
    pub completed_lines: CompletedLines,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub current_streak: u32,
    pub max_streak: u32,
    pub total_xp: u32,
    pub bingos_won: u32,
    pub is_active: bool,
    pub is_connected: bool,
    pub earliest_bingo_at: Option<DateTime<Utc>>,
}

impl SessionParticipant {
    pub fn accuracy(&self) -> f64 {
        let total = self.correct_answers + self.incorrect_answers;
        if total == 0 {
            0.0
        } else {
            self.correct_answers as f64 / total as f64
        }
    }
}

/// Static career clue reference data (§3 CareerClue).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareerClue {
    pub id: String,
    pub career_code: String,
    pub clue_text: String,
    pub skill_connection: String,
    pub difficulty: String,
    pub grade_category: String,
    pub distractor_careers: Vec<String>,
}

/// A student waiting in a room's lobby before the next game starts. Promoted
/// to a `SessionParticipant` when `startNewGame` runs (§4.E.2 `addSpectator`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectator {
    pub id: String,
    pub room_id: String,
    pub student_id: String,
    pub display_name: String,
    /// The student's career for the day (§3 `DailyLearningContext`), forced
    /// onto the center cell of their bingo card once promoted to a
    /// participant.
    pub career: String,
    pub auto_join_next: bool,
    pub joined_at: DateTime<Utc>,
}

/// Append-only click record (§3 ClickEvent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: String,
    pub session_id: String,
    pub participant_id: String,
    pub clue_id: String,
    pub question_number: u32,
    pub position: Position,
    pub is_correct: bool,
    pub response_time_seconds: f64,
    pub new_bingo_achieved: bool,
    pub xp_earned: u32,
    pub question_started_at: DateTime<Utc>,
    pub answered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bingo_slots_clamp_to_two_and_six() {
        assert_eq!(GameSession::bingo_slots_for_player_count(1), 2);
        assert_eq!(GameSession::bingo_slots_for_player_count(4), 2);
        assert_eq!(GameSession::bingo_slots_for_player_count(5), 3);
        assert_eq!(GameSession::bingo_slots_for_player_count(20), 6);
    }

    #[test]
    fn completed_lines_track_each_kind() {
        let mut completed = CompletedLines::default();
        let row = BingoLine { bingo_type: BingoType::Row, bingo_index: 2 };
        assert!(!completed.contains(&row));
        completed.insert(row);
        assert!(completed.contains(&row));
    }
}
