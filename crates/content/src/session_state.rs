use adaptive_domain::{Container, ContainerInfo, ContainerPerformance, SessionState};
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

/// Owns per-user `SessionState`: creation/resumption, progression
/// validation, and completion tracking (§4.D.7). Expiry is 4 hours of
/// inactivity, per `SessionState::EXPIRY_HOURS`.
#[derive(Default)]
pub struct SessionStateManager {
    sessions: DashMap<String, SessionState>,
}

impl SessionStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_or_resume_session(&self, user_id: &str) -> SessionState {
        let now = Utc::now();

        if let Some(existing) = self.sessions.get(user_id) {
            if !existing.is_expired(now) {
                return existing.clone();
            }
        }

        let session = SessionState::new(user_id, Uuid::new_v4().to_string(), now);
        self.sessions.insert(user_id.to_string(), session.clone());
        session
    }

    pub fn restore_state(&self, user_id: &str) -> Option<SessionState> {
        let now = Utc::now();
        let session = self.sessions.get(user_id)?;
        if session.is_expired(now) {
            None
        } else {
            Some(session.clone())
        }
    }

    pub fn validate_progression(&self, user_id: &str, target: Container) -> bool {
        self.sessions
            .get(user_id)
            .map(|s| s.can_enter(target))
            .unwrap_or(target == Container::Learn)
    }

    /// Creates the session on first container entry (§3 `SessionState`
    /// "Lifecycle: created on first container entry") before recording the
    /// container being entered.
    pub fn track_container_progression(&self, user_id: &str, container: Container) {
        self.create_or_resume_session(user_id);
        if let Some(mut session) = self.sessions.get_mut(user_id) {
            session.current_container = Some(container);
            session.last_activity_at = Utc::now();
        }
    }

    pub fn complete_container(
        &self,
        user_id: &str,
        container: Container,
        performance: ContainerPerformance,
    ) {
        let now = Utc::now();
        let mut session = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| SessionState::new(user_id, Uuid::new_v4().to_string(), now));

        session.completed_containers.push(ContainerInfo {
            container,
            completed_at: now,
        });
        session.performance_history.insert(container, performance);
        session.last_activity_at = now;
        if session.current_container == Some(container) {
            session.current_container = None;
        }
    }

    /// Persistence is handled by the caller's repository of choice; this
    /// manager is the process-local source of truth between persists. A
    /// real deployment calls this on a timer or on graceful shutdown.
    pub fn persist(&self) -> Vec<SessionState> {
        self.sessions.iter().map(|entry| entry.value().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resuming_an_active_session_keeps_its_id() {
        let manager = SessionStateManager::new();
        let first = manager.create_or_resume_session("u1");
        let second = manager.create_or_resume_session("u1");
        assert_eq!(first.session_id, second.session_id);
    }

    #[test]
    fn progression_requires_learn_before_experience() {
        let manager = SessionStateManager::new();
        manager.create_or_resume_session("u2");

        assert!(manager.validate_progression("u2", Container::Learn));
        assert!(!manager.validate_progression("u2", Container::Experience));

        manager.complete_container("u2", Container::Learn, ContainerPerformance::default());
        assert!(manager.validate_progression("u2", Container::Experience));
    }

    #[test]
    fn tracking_progression_creates_the_session_on_first_entry() {
        let manager = SessionStateManager::new();
        manager.track_container_progression("u3", Container::Learn);

        let session = manager.restore_state("u3").expect("session should exist after first entry");
        assert_eq!(session.current_container, Some(Container::Learn));
    }

    #[test]
    fn unknown_user_can_still_enter_learn() {
        let manager = SessionStateManager::new();
        assert!(manager.validate_progression("never-seen", Container::Learn));
        assert!(!manager.validate_progression("never-seen", Container::Experience));
    }
}
