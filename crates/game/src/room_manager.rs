use std::sync::Arc;

use adaptive_domain::{
    DomainError, GameSession, GameStatus, PerpetualRoom, PlayerType, RoomStatus,
    SessionParticipant, Spectator,
};
use chrono::{Duration, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::ai_agent::AiAgentService;
use crate::bingo;
use crate::careers::CAREER_POOL;
use crate::repository::GameRepository;

/// Component E.2: perpetual room lifecycle operations. Rooms themselves are
/// long-lived and never destroyed; this manager mediates game start/stop and
/// roster assembly against the `GameRepository`.
pub struct PerpetualRoomManager {
    repo: Arc<dyn GameRepository>,
    ai_service: AiAgentService,
}

impl PerpetualRoomManager {
    pub fn new(repo: Arc<dyn GameRepository>) -> Self {
        Self {
            repo,
            ai_service: AiAgentService::new(),
        }
    }

    pub async fn get_featured_rooms(&self) -> Result<Vec<PerpetualRoom>, DomainError> {
        self.repo.list_featured_rooms().await
    }

    pub async fn get_room_by_code(&self, code: &str) -> Result<Option<PerpetualRoom>, DomainError> {
        self.repo.get_room_by_code(&code.to_uppercase()).await
    }

    pub async fn get_room(&self, room_id: &str) -> Result<Option<PerpetualRoom>, DomainError> {
        self.repo.get_room(room_id).await
    }

    pub async fn add_spectator(&self, spectator: Spectator) -> Result<(), DomainError> {
        self.repo.add_spectator(&spectator).await
    }

    pub async fn remove_spectator(&self, room_id: &str, student_id: &str) -> Result<(), DomainError> {
        self.repo.remove_spectator(room_id, student_id).await
    }

    /// Promotes spectators to participants, pads the roster with AI agents,
    /// assigns bingo cards, and transitions the room to `active` (§4.E.2
    /// `startNewGame`). Returns the new session and its participants.
    pub async fn start_new_game(
        &self,
        room_id: &str,
    ) -> Result<(GameSession, Vec<SessionParticipant>), DomainError> {
        let room = self
            .repo
            .get_room(room_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("room {room_id}")))?;

        if room.status == RoomStatus::Active {
            // Idempotent: a race between two schedulers/operators never
            // double-starts a room (§8 "two concurrent game-start operations
            // on the same room never both succeed").
            let session_id = room
                .current_game_id
                .clone()
                .ok_or_else(|| DomainError::Conflict(format!("room {room_id} already active")))?;
            let session = self
                .repo
                .get_session(&session_id)
                .await?
                .ok_or_else(|| DomainError::NotFound(format!("session {session_id}")))?;
            let participants = self.repo.list_participants(&session_id).await?;
            return Ok((session, participants));
        }

        let spectators = self.repo.list_spectators(room_id).await?;
        let mut rng = SmallRng::from_os_rng();

        let mut participants: Vec<SessionParticipant> = Vec::new();
        for spectator in &spectators {
            if participants.len() as u32 >= room.max_players_per_game {
                break;
            }
            let card = bingo::generate_card(&CAREER_POOL, &spectator.career, &mut rng);
            participants.push(new_participant(
                spectator.display_name.clone(),
                PlayerType::Human,
                Some(spectator.student_id.clone()),
                None,
                card,
            ));
        }

        let ai_needed = room
            .max_players_per_game
            .saturating_sub(participants.len() as u32) as usize;
        let ai_agents = self.ai_service.create_mixed_team(ai_needed);
        for agent in ai_agents {
            let center = CAREER_POOL[rand_index(&mut rng, CAREER_POOL.len())].clone();
            let card = bingo::generate_card(&CAREER_POOL, &center, &mut rng);
            participants.push(new_participant(
                agent.display_name,
                PlayerType::Ai,
                None,
                Some(agent.difficulty),
                card,
            ));
        }

        let player_count = participants.len() as u32;
        let bingo_slots_total = GameSession::bingo_slots_for_player_count(player_count);
        let game_number = self.repo.count_sessions_for_room(room_id).await? + 1;

        let session = GameSession {
            id: uuid::Uuid::new_v4().to_string(),
            room_id: room.id.clone(),
            game_number,
            status: GameStatus::Active,
            bingo_slots_total,
            bingo_slots_remaining: bingo_slots_total,
            bingo_winners: Vec::new(),
            questions_asked: Vec::new(),
            current_question_number: 0,
            started_at: Utc::now(),
            completed_at: None,
            duration_seconds: None,
        };

        self.repo.create_session(&session).await?;
        for participant in &mut participants {
            participant.session_id = session.id.clone();
            self.repo.save_participant(participant).await?;
        }

        for spectator in &spectators {
            self.repo.remove_spectator(room_id, &spectator.student_id).await?;
        }

        let mut updated_room = room;
        updated_room.status = RoomStatus::Active;
        updated_room.current_game_id = Some(session.id.clone());
        updated_room.next_game_starts_at = None;
        self.repo.save_room(&updated_room).await?;

        Ok((session, participants))
    }

    /// Marks a session completed, transitions the room to intermission, and
    /// schedules `next_game_starts_at` (§4.E.2 `completeGame`).
    pub async fn complete_game(&self, mut session: GameSession) -> Result<PerpetualRoom, DomainError> {
        let room = self
            .repo
            .get_room(&session.room_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("room {}", session.room_id)))?;

        let now = Utc::now();
        session.status = GameStatus::Completed;
        session.completed_at = Some(now);
        session.duration_seconds = Some((now - session.started_at).num_seconds().max(0) as u32);
        self.repo.save_session(&session).await?;

        let mut updated_room = room;
        updated_room.status = RoomStatus::Intermission;
        updated_room.current_game_id = None;
        updated_room.next_game_starts_at =
            Some(now + Duration::seconds(updated_room.intermission_duration_seconds as i64));
        self.repo.save_room(&updated_room).await?;

        Ok(updated_room)
    }

    pub async fn manual_start(&self, room_id: &str) -> Result<(GameSession, Vec<SessionParticipant>), DomainError> {
        self.start_new_game(room_id).await
    }

    pub async fn pause_room(&self, room_id: &str) -> Result<(), DomainError> {
        let mut room = self
            .repo
            .get_room(room_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("room {room_id}")))?;
        room.status = RoomStatus::Paused;
        self.repo.save_room(&room).await
    }

    pub async fn resume_room(&self, room_id: &str) -> Result<(), DomainError> {
        let mut room = self
            .repo
            .get_room(room_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("room {room_id}")))?;
        room.status = RoomStatus::Intermission;
        room.next_game_starts_at = Some(Utc::now());
        self.repo.save_room(&room).await
    }
}

fn rand_index(rng: &mut SmallRng, len: usize) -> usize {
    use rand::Rng;
    rng.random_range(0..len)
}

fn new_participant(
    display_name: String,
    player_type: PlayerType,
    student_id: Option<String>,
    ai_difficulty: Option<adaptive_domain::AiDifficulty>,
    card: adaptive_domain::BingoCard,
) -> SessionParticipant {
    let mut unlocked_positions = std::collections::HashSet::new();
    if player_type == PlayerType::Human {
        // Free center (§3 SessionParticipant: "pre-unlocked for human
        // participants (free center)").
        unlocked_positions.insert((2u8, 2u8));
    }

    SessionParticipant {
        id: format!("participant-{}", uuid::Uuid::new_v4()),
        session_id: String::new(),
        player_type,
        display_name,
        student_id,
        ai_difficulty,
        bingo_card: card,
        unlocked_positions,
        completed_lines: Default::default(),
        correct_answers: 0,
        incorrect_answers: 0,
        current_streak: 0,
        max_streak: 0,
        total_xp: 0,
        bingos_won: 0,
        is_active: true,
        is_connected: true,
        earliest_bingo_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_domain::{CareerClue, ClickEvent};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRepo {
        rooms: Mutex<std::collections::HashMap<String, PerpetualRoom>>,
        sessions: Mutex<std::collections::HashMap<String, GameSession>>,
        participants: Mutex<std::collections::HashMap<String, Vec<SessionParticipant>>>,
        spectators: Mutex<std::collections::HashMap<String, Vec<Spectator>>>,
    }

    #[async_trait]
    impl GameRepository for FakeRepo {
        async fn get_room(&self, room_id: &str) -> Result<Option<PerpetualRoom>, DomainError> {
            Ok(self.rooms.lock().unwrap().get(room_id).cloned())
        }
        async fn get_room_by_code(&self, _code: &str) -> Result<Option<PerpetualRoom>, DomainError> {
            Ok(None)
        }
        async fn list_active_rooms(&self) -> Result<Vec<PerpetualRoom>, DomainError> {
            Ok(self.rooms.lock().unwrap().values().cloned().collect())
        }
        async fn list_featured_rooms(&self) -> Result<Vec<PerpetualRoom>, DomainError> {
            Ok(vec![])
        }
        async fn save_room(&self, room: &PerpetualRoom) -> Result<(), DomainError> {
            self.rooms.lock().unwrap().insert(room.id.clone(), room.clone());
            Ok(())
        }
        async fn create_session(&self, session: &GameSession) -> Result<(), DomainError> {
            self.sessions.lock().unwrap().insert(session.id.clone(), session.clone());
            Ok(())
        }
        async fn save_session(&self, session: &GameSession) -> Result<(), DomainError> {
            self.sessions.lock().unwrap().insert(session.id.clone(), session.clone());
            Ok(())
        }
        async fn get_session(&self, session_id: &str) -> Result<Option<GameSession>, DomainError> {
            Ok(self.sessions.lock().unwrap().get(session_id).cloned())
        }
        async fn count_sessions_for_room(&self, room_id: &str) -> Result<u32, DomainError> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.room_id == room_id)
                .count() as u32)
        }
        async fn save_participant(&self, participant: &SessionParticipant) -> Result<(), DomainError> {
            self.participants
                .lock()
                .unwrap()
                .entry(participant.session_id.clone())
                .or_default()
                .push(participant.clone());
            Ok(())
        }
        async fn list_participants(&self, session_id: &str) -> Result<Vec<SessionParticipant>, DomainError> {
            Ok(self.participants.lock().unwrap().get(session_id).cloned().unwrap_or_default())
        }
        async fn append_click(&self, _click: &ClickEvent) -> Result<(), DomainError> {
            Ok(())
        }
        async fn list_spectators(&self, room_id: &str) -> Result<Vec<Spectator>, DomainError> {
            Ok(self.spectators.lock().unwrap().get(room_id).cloned().unwrap_or_default())
        }
        async fn add_spectator(&self, spectator: &Spectator) -> Result<(), DomainError> {
            self.spectators
                .lock()
                .unwrap()
                .entry(spectator.room_id.clone())
                .or_default()
                .push(spectator.clone());
            Ok(())
        }
        async fn remove_spectator(&self, room_id: &str, student_id: &str) -> Result<(), DomainError> {
            if let Some(list) = self.spectators.lock().unwrap().get_mut(room_id) {
                list.retain(|s| s.student_id != student_id);
            }
            Ok(())
        }
        async fn clues_for_grade(&self, _grade_category: &str) -> Result<Vec<CareerClue>, DomainError> {
            Ok(crate::careers::CAREER_CLUES.clone())
        }
        async fn try_decrement_bingo_slot(&self, session_id: &str, expected: u32) -> Result<bool, DomainError> {
            let mut sessions = self.sessions.lock().unwrap();
            let session = sessions.get_mut(session_id).unwrap();
            if session.bingo_slots_remaining == expected && expected > 0 {
                session.bingo_slots_remaining -= 1;
                Ok(true)
            } else {
                Ok(false)
            }
        }
    }

    fn sample_room(id: &str) -> PerpetualRoom {
        PerpetualRoom {
            id: id.to_string(),
            room_code: "ABC123".to_string(),
            room_name: "Kindergarten Lounge".to_string(),
            grade_category: "K-2".to_string(),
            max_players_per_game: 4,
            bingo_slots_per_game: 4,
            question_time_limit_seconds: 20,
            intermission_duration_seconds: 30,
            status: RoomStatus::Intermission,
            current_game_id: None,
            next_game_starts_at: Some(Utc::now()),
            is_active: true,
            is_featured: true,
        }
    }

    #[tokio::test]
    async fn start_new_game_pads_roster_with_ai_and_assigns_cards() {
        let repo = Arc::new(FakeRepo::default());
        repo.save_room(&sample_room("r1")).await.unwrap();
        repo.add_spectator(&Spectator {
            id: "spec-1".into(),
            room_id: "r1".into(),
            student_id: "student-1".into(),
            display_name: "Ada".into(),
            career: "Chef".into(),
            auto_join_next: true,
            joined_at: Utc::now(),
        })
        .await
        .unwrap();

        let manager = PerpetualRoomManager::new(repo.clone());
        let (session, participants) = manager.start_new_game("r1").await.unwrap();

        assert_eq!(participants.len(), 4);
        assert_eq!(session.bingo_slots_total, GameSession::bingo_slots_for_player_count(4));
        let human = participants.iter().find(|p| p.player_type == PlayerType::Human).unwrap();
        assert_eq!(human.bingo_card[2][2], "Chef");
        assert!(human.unlocked_positions.contains(&(2, 2)));

        let room_after = repo.get_room("r1").await.unwrap().unwrap();
        assert_eq!(room_after.status, RoomStatus::Active);
    }

    #[tokio::test]
    async fn starting_an_already_active_room_is_idempotent() {
        let repo = Arc::new(FakeRepo::default());
        repo.save_room(&sample_room("r2")).await.unwrap();
        repo.add_spectator(&Spectator {
            id: "spec-2".into(),
            room_id: "r2".into(),
            student_id: "student-2".into(),
            display_name: "Milo".into(),
            career: "Vet".into(),
            auto_join_next: true,
            joined_at: Utc::now(),
        })
        .await
        .unwrap();

        let manager = PerpetualRoomManager::new(repo.clone());
        let (first, _) = manager.start_new_game("r2").await.unwrap();
        let (second, _) = manager.start_new_game("r2").await.unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn complete_game_schedules_next_game_start() {
        let repo = Arc::new(FakeRepo::default());
        repo.save_room(&sample_room("r3")).await.unwrap();
        repo.add_spectator(&Spectator {
            id: "spec-3".into(),
            room_id: "r3".into(),
            student_id: "student-3".into(),
            display_name: "Jo".into(),
            career: "Pilot".into(),
            auto_join_next: true,
            joined_at: Utc::now(),
        })
        .await
        .unwrap();

        let manager = PerpetualRoomManager::new(repo.clone());
        let (session, _) = manager.start_new_game("r3").await.unwrap();
        let room = manager.complete_game(session).await.unwrap();

        assert_eq!(room.status, RoomStatus::Intermission);
        assert!(room.next_game_starts_at.unwrap() > Utc::now());
        assert!(room.current_game_id.is_none());
    }
}
