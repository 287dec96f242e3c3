//! Daily learning context and session state (§3, §4.D.1, §4.D.7, §9).

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Immutable-for-the-day per-student tuple that every generated piece of
/// content must agree with. Created once per `(student_id, date)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyLearningContext {
    pub student_id: String,
    pub date: NaiveDate,
    pub primary_skill: String,
    pub career: String,
    pub companion: String,
    pub grade_level: String,
    pub subjects: Vec<String>,
}

/// A container in the LEARN -> EXPERIENCE -> DISCOVER lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Container {
    Learn,
    Experience,
    Discover,
}

impl Container {
    /// Ordinal position in the required completion order.
    pub fn ordinal(self) -> u8 {
        match self {
            Container::Learn => 0,
            Container::Experience => 1,
            Container::Discover => 2,
        }
    }

    pub const ALL: [Container; 3] = [Container::Learn, Container::Experience, Container::Discover];
}

/// Info about a completed container, kept in `SessionState::completed_containers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub container: Container,
    pub completed_at: DateTime<Utc>,
}

/// Aggregated performance for a single container, reported to the pipeline
/// and journey engine on completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerPerformance {
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub hints_used: u32,
    pub total_time_seconds: u32,
    /// Per-skill outcomes attempted within this container.
    pub skill_results: Vec<SkillAttemptResult>,
}

impl ContainerPerformance {
    pub fn accuracy(&self) -> Option<f64> {
        if self.questions_answered == 0 {
            None
        } else {
            Some(self.correct_answers as f64 / self.questions_answered as f64)
        }
    }
}

/// One skill's worth of performance within a container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillAttemptResult {
    pub skill_id: String,
    pub correct_answers: u32,
    pub questions_answered: u32,
}

/// Per-user session state. Created on first container entry, expired after
/// 4 hours of inactivity (§3 Container lifecycle constraint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub user_id: String,
    pub session_id: String,
    pub current_container: Option<Container>,
    pub completed_containers: Vec<ContainerInfo>,
    pub performance_history: HashMap<Container, ContainerPerformance>,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl SessionState {
    pub const EXPIRY_HOURS: i64 = 4;

    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            current_container: None,
            completed_containers: Vec::new(),
            performance_history: HashMap::new(),
            started_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_activity_at).num_hours() >= Self::EXPIRY_HOURS
    }

    pub fn has_completed(&self, container: Container) -> bool {
        self.completed_containers
            .iter()
            .any(|c| c.container == container)
    }

    /// Validates the LEARN -> EXPERIENCE -> DISCOVER ordering invariant.
    pub fn can_enter(&self, target: Container) -> bool {
        match target {
            Container::Learn => true,
            Container::Experience => self.has_completed(Container::Learn),
            Container::Discover => self.has_completed(Container::Experience),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_progression_is_enforced() {
        let now = Utc::now();
        let mut session = SessionState::new("u1", "s1", now);
        assert!(session.can_enter(Container::Learn));
        assert!(!session.can_enter(Container::Experience));
        assert!(!session.can_enter(Container::Discover));

        session.completed_containers.push(ContainerInfo {
            container: Container::Learn,
            completed_at: now,
        });
        assert!(session.can_enter(Container::Experience));
        assert!(!session.can_enter(Container::Discover));
    }

    #[test]
    fn session_expires_after_four_hours() {
        let now = Utc::now();
        let mut session = SessionState::new("u1", "s1", now);
        assert!(!session.is_expired(now));
        session.last_activity_at = now - chrono::Duration::hours(5);
        assert!(session.is_expired(now));
    }
}
