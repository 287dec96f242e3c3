use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use adaptive_domain::{
    BingoLine, BingoWinner, CareerClue, ClickEvent, DomainError, GameSession, LeaderboardEntry,
    ParticipantSummary, PerpetualRoom, PlayerType, Position, RoomEvent, SessionParticipant,
};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use tokio::sync::mpsc;

use crate::ai_agent::AiAgentService;
use crate::bingo;
use crate::broadcast::RoomBroadcaster;
use crate::repository::GameRepository;
use crate::room_manager::PerpetualRoomManager;

/// A click reaching the game loop, whether from a human (over the real-time
/// channel) or from a scheduled AI agent timer. `answered_at` is always
/// server-recorded — never trusted from the client (§4.E.4 Ordering).
#[derive(Debug, Clone)]
pub struct IncomingClick {
    pub participant_id: String,
    pub position: Position,
    pub clue_id: String,
    pub answered_at: DateTime<Utc>,
}

/// Channel capacity for a session's incoming-click queue.
pub const CLICK_CHANNEL_CAPACITY: usize = 256;

/// Creates the channel a caller registers (keyed by session id) *before*
/// spawning `run_game`, so human clicks can be forwarded in while the game
/// is running rather than only after it completes.
pub fn new_click_channel() -> (mpsc::Sender<IncomingClick>, mpsc::Receiver<IncomingClick>) {
    mpsc::channel(CLICK_CHANNEL_CAPACITY)
}

struct RuntimeState {
    session: GameSession,
    room: PerpetualRoom,
    participants: HashMap<String, SessionParticipant>,
    asked_clue_ids: HashSet<String>,
    current_clue: Option<CareerClue>,
    question_started_at: Option<DateTime<Utc>>,
}

/// Component E.4: runs one `GameSession`'s question cycle end to end. One
/// instance of the loop owns its `RuntimeState` exclusively for the
/// session's lifetime -- the single-threaded cooperative event loop of §5,
/// expressed as one task that drains an mpsc channel instead of sharing
/// memory across tasks.
pub struct GameOrchestrator {
    repo: Arc<dyn GameRepository>,
    broadcaster: Arc<dyn RoomBroadcaster>,
    room_manager: Arc<PerpetualRoomManager>,
    ai_service: AiAgentService,
}

const INTER_QUESTION_PAUSE_SECONDS: u64 = 2;

impl GameOrchestrator {
    pub fn new(
        repo: Arc<dyn GameRepository>,
        broadcaster: Arc<dyn RoomBroadcaster>,
        room_manager: Arc<PerpetualRoomManager>,
    ) -> Self {
        Self {
            repo,
            broadcaster,
            room_manager,
            ai_service: AiAgentService::new(),
        }
    }

    /// Runs the full game loop: `game_started` -> question cycles -> each
    /// cycle's `question_started` / `player_*` / `bingo_achieved` broadcasts
    /// -> `game_completed`. Returns the completed session. Callers must
    /// build `rx` via [`new_click_channel`] and register its paired sender
    /// *before* awaiting this, so human clicks can reach the loop mid-game.
    pub async fn run_game(
        &self,
        session: GameSession,
        room: PerpetualRoom,
        participants: Vec<SessionParticipant>,
        click_tx: mpsc::Sender<IncomingClick>,
        mut rx: mpsc::Receiver<IncomingClick>,
    ) -> Result<GameSession, DomainError> {
        let mut state = RuntimeState {
            session,
            room,
            participants: participants.into_iter().map(|p| (p.id.clone(), p)).collect(),
            asked_clue_ids: HashSet::new(),
            current_clue: None,
            question_started_at: None,
        };

        self.broadcaster.publish(
            &state.room.id,
            RoomEvent::GameStarted {
                room_id: state.room.id.clone(),
                session_id: state.session.id.clone(),
                game_number: state.session.game_number,
                participants: state
                    .participants
                    .values()
                    .map(|p| ParticipantSummary {
                        id: p.id.clone(),
                        display_name: p.display_name.clone(),
                        player_type: p.player_type,
                    })
                    .collect(),
            },
        );

        let clues = self.repo.clues_for_grade(&state.room.grade_category).await?;
        if clues.is_empty() {
            return Err(DomainError::BusinessLogic(format!(
                "no clues available for grade category {}",
                state.room.grade_category
            )));
        }

        let mut rng = SmallRng::from_os_rng();

        while state.session.current_question_number < GameSession::MAX_QUESTIONS
            && state.session.bingo_slots_remaining > 0
        {
            let clue = self.pick_next_clue(&clues, &mut state.asked_clue_ids, &mut rng);
            state.asked_clue_ids.insert(clue.id.clone());
            state.session.questions_asked.push(clue.id.clone());
            state.session.current_question_number += 1;
            let question_started_at = Utc::now();
            state.current_clue = Some(clue.clone());
            state.question_started_at = Some(question_started_at);

            self.broadcaster.publish(
                &state.room.id,
                RoomEvent::QuestionStarted {
                    room_id: state.room.id.clone(),
                    question_number: state.session.current_question_number,
                    clue_text: clue.clue_text.clone(),
                    skill_connection: clue.skill_connection.clone(),
                    career_code: clue.career_code.clone(),
                    time_limit_seconds: state.room.question_time_limit_seconds,
                    started_at: question_started_at,
                },
            );

            self.schedule_ai_clicks(&state, &clue, &click_tx, &mut rng);

            let deadline = tokio::time::Instant::now()
                + StdDuration::from_secs(
                    state.room.question_time_limit_seconds as u64 + INTER_QUESTION_PAUSE_SECONDS,
                );

            loop {
                let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                if remaining.is_zero() {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(remaining) => break,
                    maybe_click = rx.recv() => {
                        let Some(first) = maybe_click else { break };
                        let mut batch = vec![first];
                        while let Ok(more) = rx.try_recv() {
                            batch.push(more);
                        }
                        // §8 "claim order determined by answered_at, ties
                        // broken by ascending participant_id" -- sort the
                        // whole batch received in this tick before applying.
                        batch.sort_by(|a, b| {
                            a.answered_at
                                .cmp(&b.answered_at)
                                .then_with(|| a.participant_id.cmp(&b.participant_id))
                        });
                        for click in batch {
                            self.process_click(&mut state, click).await;
                        }
                    }
                }
            }
        }

        self.broadcaster.publish(
            &state.room.id,
            RoomEvent::GameCompleted {
                room_id: state.room.id.clone(),
                game_number: state.session.game_number,
                winners: self.winners(&state),
                leaderboard: self.leaderboard(&state),
                next_game_starts_at: Utc::now()
                    + chrono::Duration::seconds(state.room.intermission_duration_seconds as i64),
                intermission_seconds: state.room.intermission_duration_seconds,
            },
        );

        for participant in state.participants.values() {
            self.repo.save_participant(participant).await?;
        }
        let room_after = self.room_manager.complete_game(state.session.clone()).await?;
        state.room = room_after;

        Ok(state.session)
    }

    fn pick_next_clue(
        &self,
        clues: &[CareerClue],
        asked: &mut HashSet<String>,
        rng: &mut SmallRng,
    ) -> CareerClue {
        let unused: Vec<&CareerClue> = clues.iter().filter(|c| !asked.contains(&c.id)).collect();
        if let Some(clue) = unused.choose(rng) {
            (*clue).clone()
        } else {
            // Exhausted the clue bank inside one game: recycle (spec allows
            // up to 20 questions; a small clue bank must not stall the loop).
            asked.clear();
            clues.choose(rng).expect("caller already checked non-empty").clone()
        }
    }

    fn schedule_ai_clicks(
        &self,
        state: &RuntimeState,
        clue: &CareerClue,
        tx: &mpsc::Sender<IncomingClick>,
        rng: &mut SmallRng,
    ) {
        for participant in state.participants.values() {
            if participant.player_type != PlayerType::Ai || !participant.is_active {
                continue;
            }
            let Some(difficulty) = participant.ai_difficulty else { continue };
            let decision = self
                .ai_service
                .decide_click(clue, &participant.bingo_card, difficulty, rng);
            let Some(position) = decision.position else { continue };

            let tx = tx.clone();
            let participant_id = participant.id.clone();
            let clue_id = clue.id.clone();
            let response_time = decision.response_time_seconds;
            tokio::spawn(async move {
                tokio::time::sleep(StdDuration::from_secs_f64(response_time)).await;
                let _ = tx
                    .send(IncomingClick {
                        participant_id,
                        position,
                        clue_id,
                        answered_at: Utc::now(),
                    })
                    .await;
            });
        }
    }

    /// §4.E.4 `processClick`.
    async fn process_click(&self, state: &mut RuntimeState, click: IncomingClick) {
        let Some(clue) = state.current_clue.clone() else { return };
        if click.clue_id != clue.id {
            return; // stale question, silently dropped
        }
        let Some(question_started_at) = state.question_started_at else { return };

        let Some(participant) = state.participants.get(&click.participant_id) else {
            return;
        };
        if !participant.is_active || !participant.is_connected {
            return;
        }
        if participant.unlocked_positions.contains(&click.position) {
            return;
        }

        let (row, col) = (click.position.0 as usize, click.position.1 as usize);
        if row >= 5 || col >= 5 {
            return;
        }
        let is_correct = participant.bingo_card[row][col] == clue.career_code;
        let response_time_seconds = (click.answered_at - question_started_at)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0;

        let time_limit = state.room.question_time_limit_seconds as f64;
        let mut xp_earned = 0u32;

        {
            let participant = state.participants.get_mut(&click.participant_id).unwrap();
            if is_correct {
                participant.unlocked_positions.insert(click.position);
            } else {
                participant.current_streak = 0;
                participant.incorrect_answers += 1;
            }
        }

        let mut new_bingo_achieved = false;
        if is_correct {
            let new_lines = {
                let participant = &state.participants[&click.participant_id];
                bingo::check_for_bingos(&participant.unlocked_positions, &participant.completed_lines)
            };

            for line in &new_lines {
                if state.session.bingo_slots_remaining == 0 {
                    break;
                }
                let won = self
                    .repo
                    .try_decrement_bingo_slot(&state.session.id, state.session.bingo_slots_remaining)
                    .await
                    .unwrap_or(false);
                if !won {
                    continue;
                }
                state.session.bingo_slots_remaining -= 1;
                new_bingo_achieved = true;
                let rank = state.session.bingo_winners.len() as u32 + 1;
                let xp_awarded = bingo_xp_for_rank(rank);

                let participant = state.participants.get_mut(&click.participant_id).unwrap();
                participant.completed_lines.insert(*line);
                participant.bingos_won += 1;
                if participant.earliest_bingo_at.is_none() {
                    participant.earliest_bingo_at = Some(click.answered_at);
                }

                state.session.bingo_winners.push(adaptive_domain::BingoWinner {
                    participant_id: click.participant_id.clone(),
                    bingo_type: line.bingo_type,
                    bingo_index: line.bingo_index,
                    achieved_at: click.answered_at,
                    xp_awarded,
                });

                self.broadcaster.publish(
                    &state.room.id,
                    RoomEvent::BingoAchieved {
                        room_id: state.room.id.clone(),
                        participant_id: click.participant_id.clone(),
                        display_name: participant.display_name.clone(),
                        bingo_number: rank,
                        bingo_type: line.bingo_type,
                        bingo_index: line.bingo_index,
                        slots_remaining: state.session.bingo_slots_remaining,
                        xp_awarded,
                    },
                );
            }

            let speed_bonus = (10.0 * (1.0 - response_time_seconds / time_limit).max(0.0)).round() as u32;
            let participant = state.participants.get_mut(&click.participant_id).unwrap();
            let streak_bonus = (participant.current_streak * 2).min(20);
            xp_earned = 10 + speed_bonus + streak_bonus;
            participant.current_streak += 1;
            participant.max_streak = participant.max_streak.max(participant.current_streak);
            participant.correct_answers += 1;
            participant.total_xp += xp_earned;

            self.broadcaster.publish(
                &state.room.id,
                RoomEvent::PlayerCorrect {
                    room_id: state.room.id.clone(),
                    participant_id: click.participant_id.clone(),
                    display_name: participant.display_name.clone(),
                    position: click.position,
                    response_time_seconds,
                    streak: participant.current_streak,
                    total_xp: participant.total_xp,
                },
            );
        } else {
            let participant = &state.participants[&click.participant_id];
            self.broadcaster.publish(
                &state.room.id,
                RoomEvent::PlayerIncorrect {
                    room_id: state.room.id.clone(),
                    participant_id: click.participant_id.clone(),
                    display_name: participant.display_name.clone(),
                    position: click.position,
                    response_time_seconds,
                },
            );
        }

        let event = ClickEvent {
            id: format!("click-{}", uuid::Uuid::new_v4()),
            session_id: state.session.id.clone(),
            participant_id: click.participant_id.clone(),
            clue_id: click.clue_id.clone(),
            question_number: state.session.current_question_number,
            position: click.position,
            is_correct,
            response_time_seconds,
            new_bingo_achieved,
            xp_earned,
            question_started_at,
            answered_at: click.answered_at,
        };
        let _ = self.repo.append_click(&event).await;
    }

    fn winners(&self, state: &RuntimeState) -> Vec<LeaderboardEntry> {
        self.leaderboard(state)
            .into_iter()
            .filter(|entry| entry.bingos_won > 0)
            .collect()
    }

    fn leaderboard(&self, state: &RuntimeState) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = state
            .participants
            .values()
            .map(|p| LeaderboardEntry {
                participant_id: p.id.clone(),
                display_name: p.display_name.clone(),
                bingos_won: p.bingos_won,
                total_xp: p.total_xp,
                accuracy: p.accuracy(),
                earliest_bingo_at: p.earliest_bingo_at,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.bingos_won
                .cmp(&a.bingos_won)
                .then_with(|| b.total_xp.cmp(&a.total_xp))
                .then_with(|| b.accuracy.partial_cmp(&a.accuracy).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| match (a.earliest_bingo_at, b.earliest_bingo_at) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
        });

        entries
    }
}

/// `bingoXP(rank)`: rank 1 -> 50, 2 -> 40, 3 -> 30, >=4 -> 20 (§4.E.4).
fn bingo_xp_for_rank(rank: u32) -> u32 {
    match rank {
        1 => 50,
        2 => 40,
        3 => 30,
        _ => 20,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bingo_xp_matches_canonical_rank_table() {
        assert_eq!(bingo_xp_for_rank(1), 50);
        assert_eq!(bingo_xp_for_rank(2), 40);
        assert_eq!(bingo_xp_for_rank(3), 30);
        assert_eq!(bingo_xp_for_rank(4), 20);
        assert_eq!(bingo_xp_for_rank(10), 20);
    }
}
