//! Journey / SubjectProgress types (§3, §4.C).

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-student record spanning every subject they have touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
    pub student_id: String,
    pub grade_level: String,
    pub started_at: DateTime<Utc>,
    pub subject_progress: HashMap<String, SubjectProgress>,
}

impl Journey {
    pub fn new(student_id: impl Into<String>, grade_level: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            student_id: student_id.into(),
            grade_level: grade_level.into(),
            started_at: now,
            subject_progress: HashMap::new(),
        }
    }
}

/// Outcome of a skill attempt, reported by the content pipeline's
/// performance tracker to `processSkillCompletion`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkillOutcome {
    Mastered,
    Practiced,
    Struggled,
}

/// Raw performance counters behind a skill completion, used to derive
/// mastery when the caller didn't directly assert `Mastered`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct CompletionMetrics {
    pub correct_answers: u32,
    pub questions_answered: u32,
}

impl CompletionMetrics {
    /// Default mastery threshold, tunable — §9 Open Question (i).
    pub const DEFAULT_MASTERY_THRESHOLD: f64 = 0.8;

    pub fn accuracy(&self) -> Option<f64> {
        if self.questions_answered == 0 {
            None
        } else {
            Some(self.correct_answers as f64 / self.questions_answered as f64)
        }
    }

    pub fn meets_mastery(&self, threshold: f64) -> bool {
        self.accuracy().is_some_and(|acc| acc >= threshold)
    }
}

/// Per-cluster progress bookkeeping, nested inside `SubjectProgress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterProgress {
    pub cluster_id: String,
    pub recommended_path: Vec<String>,
    pub current_index: usize,
    pub skills_attempted: BTreeSet<String>,
    pub skills_mastered: BTreeSet<String>,
}

impl ClusterProgress {
    pub fn new(cluster_id: impl Into<String>, recommended_path: Vec<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            recommended_path,
            current_index: 0,
            skills_attempted: BTreeSet::new(),
            skills_mastered: BTreeSet::new(),
        }
    }

    /// Skill at the current pointer, if any remain.
    pub fn current_skill_id(&self) -> Option<&String> {
        self.recommended_path.get(self.current_index)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.recommended_path.len()
    }
}

/// Per-(student, subject) progression state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectProgress {
    pub subject: String,
    pub current_cluster_prefix: String,
    pub cluster_progress: ClusterProgress,
    pub total_skills_mastered: u32,
    pub last_activity_at: DateTime<Utc>,
    /// Set once the subject has no further clusters to offer.
    pub mastered: bool,
}

impl SubjectProgress {
    pub fn new(
        subject: impl Into<String>,
        cluster_prefix: impl Into<String>,
        cluster_progress: ClusterProgress,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            current_cluster_prefix: cluster_prefix.into(),
            cluster_progress,
            total_skills_mastered: 0,
            last_activity_at: now,
            mastered: false,
        }
    }
}

/// A single active assignment returned by `getContinuousAssignments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub subject: String,
    pub skill_id: String,
    pub skill_name: String,
    pub cluster_prefix: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_metrics_accuracy_threshold() {
        let metrics = CompletionMetrics {
            correct_answers: 8,
            questions_answered: 10,
        };
        assert_eq!(metrics.accuracy(), Some(0.8));
        assert!(metrics.meets_mastery(CompletionMetrics::DEFAULT_MASTERY_THRESHOLD));

        let low = CompletionMetrics {
            correct_answers: 5,
            questions_answered: 10,
        };
        assert!(!low.meets_mastery(CompletionMetrics::DEFAULT_MASTERY_THRESHOLD));
    }

    #[test]
    fn cluster_progress_tracks_pointer() {
        let mut progress = ClusterProgress::new(
            "A",
            vec!["A.1".to_string(), "A.2".to_string(), "A.3".to_string()],
        );
        assert_eq!(progress.current_skill_id(), Some(&"A.1".to_string()));
        progress.current_index += 1;
        assert_eq!(progress.current_skill_id(), Some(&"A.2".to_string()));
        progress.current_index = 3;
        assert!(progress.is_exhausted());
        assert_eq!(progress.current_skill_id(), None);
    }
}
