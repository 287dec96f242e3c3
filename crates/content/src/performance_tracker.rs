use std::collections::HashMap;

use adaptive_domain::{Container, ContainerPerformance, Question};
use dashmap::DashMap;

/// One recorded question attempt, the unit `analyzePatterns` and
/// `calculateMastery` work over.
#[derive(Debug, Clone)]
pub struct QuestionAttempt {
    pub question_id: String,
    pub question_type: String,
    pub subject: String,
    pub skill_id: String,
    pub correct: bool,
    pub time_spent_seconds: u32,
    pub hints_used: u32,
    pub attempts: u32,
}

/// A detected behavioral pattern, surfaced to callers deciding on
/// scaffolding or pacing adjustments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Accuracy on this skill has dropped across the most recent attempts.
    Struggling { skill_id: String },
    /// Consistently fast and correct: a candidate for advanced difficulty.
    Mastering { skill_id: String },
    /// Heavy hint usage relative to attempts.
    HintDependent { skill_id: String },
}

const MASTERY_WINDOW: usize = 10;
/// Exponential-decay weighting: more recent attempts count for more.
const DECAY: f64 = 0.85;

/// Records every question attempt per user and derives mastery, strengths,
/// and weaknesses from the history (§4.D.5).
#[derive(Default)]
pub struct PerformanceTracker {
    attempts: DashMap<String, Vec<QuestionAttempt>>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_question_performance(
        &self,
        user_id: &str,
        question: &Question,
        correct: bool,
        time_spent_seconds: u32,
        hints_used: u32,
        attempt_number: u32,
    ) {
        let attempt = QuestionAttempt {
            question_id: question.id.clone(),
            question_type: format!("{:?}", question.question_type),
            subject: question.subject.clone(),
            skill_id: question.skill_id.clone(),
            correct,
            time_spent_seconds,
            hints_used,
            attempts: attempt_number,
        };
        self.attempts.entry(user_id.to_string()).or_default().push(attempt);
    }

    /// Aggregates recorded attempts into a `ContainerPerformance`. Container
    /// filtering is left to the caller, since raw attempts aren't tagged
    /// with a container here — the session layer owns that association.
    pub fn get_performance(&self, user_id: &str) -> ContainerPerformance {
        let Some(attempts) = self.attempts.get(user_id) else {
            return ContainerPerformance::default();
        };

        let mut perf = ContainerPerformance::default();
        let mut per_skill: HashMap<String, (u32, u32)> = HashMap::new();

        for attempt in attempts.iter() {
            perf.questions_answered += 1;
            perf.hints_used += attempt.hints_used;
            perf.total_time_seconds += attempt.time_spent_seconds;
            if attempt.correct {
                perf.correct_answers += 1;
            }
            let entry = per_skill.entry(attempt.skill_id.clone()).or_insert((0, 0));
            entry.1 += 1;
            if attempt.correct {
                entry.0 += 1;
            }
        }

        perf.skill_results = per_skill
            .into_iter()
            .map(|(skill_id, (correct, total))| adaptive_domain::SkillAttemptResult {
                skill_id,
                correct_answers: correct,
                questions_answered: total,
            })
            .collect();

        perf
    }

    /// Rolling exponential-decay average of correctness over the last
    /// `MASTERY_WINDOW` attempts on `skill_id`. `None` if there is no
    /// history for that skill yet.
    pub fn calculate_mastery(&self, user_id: &str, skill_id: &str) -> Option<f64> {
        let attempts = self.attempts.get(user_id)?;
        let recent: Vec<&QuestionAttempt> = attempts
            .iter()
            .filter(|a| a.skill_id == skill_id)
            .rev()
            .take(MASTERY_WINDOW)
            .collect();

        if recent.is_empty() {
            return None;
        }

        // `recent[0]` is the most recent attempt, weighted highest.
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for (i, attempt) in recent.iter().enumerate() {
            let weight = DECAY.powi(i as i32);
            weighted_sum += weight * if attempt.correct { 1.0 } else { 0.0 };
            weight_total += weight;
        }

        Some(weighted_sum / weight_total)
    }

    pub fn analyze_patterns(&self, user_id: &str) -> Vec<Pattern> {
        let Some(attempts) = self.attempts.get(user_id) else {
            return Vec::new();
        };

        let mut per_skill: HashMap<String, Vec<&QuestionAttempt>> = HashMap::new();
        for attempt in attempts.iter() {
            per_skill.entry(attempt.skill_id.clone()).or_default().push(attempt);
        }

        let mut patterns = Vec::new();
        for (skill_id, skill_attempts) in per_skill {
            let total = skill_attempts.len() as f64;
            let correct = skill_attempts.iter().filter(|a| a.correct).count() as f64;
            let accuracy = correct / total;
            let hint_rate = skill_attempts.iter().map(|a| a.hints_used).sum::<u32>() as f64 / total;

            if accuracy < 0.5 && skill_attempts.len() >= 3 {
                patterns.push(Pattern::Struggling { skill_id: skill_id.clone() });
            } else if accuracy >= 0.9 && skill_attempts.len() >= 3 {
                patterns.push(Pattern::Mastering { skill_id: skill_id.clone() });
            }
            if hint_rate >= 1.0 {
                patterns.push(Pattern::HintDependent { skill_id });
            }
        }

        patterns
    }

    pub fn get_strengths(&self, user_id: &str) -> Vec<String> {
        self.analyze_patterns(user_id)
            .into_iter()
            .filter_map(|p| match p {
                Pattern::Mastering { skill_id } => Some(skill_id),
                _ => None,
            })
            .collect()
    }

    pub fn get_weaknesses(&self, user_id: &str) -> Vec<String> {
        self.analyze_patterns(user_id)
            .into_iter()
            .filter_map(|p| match p {
                Pattern::Struggling { skill_id } => Some(skill_id),
                _ => None,
            })
            .collect()
    }
}

/// Present so `ContainerPerformance` can be keyed by container upstream
/// without this tracker needing to know about containers itself.
pub fn container_key(user_id: &str, container: Container) -> String {
    format!("{user_id}:{container:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_domain::{Difficulty, QuestionType};

    fn question(skill_id: &str) -> Question {
        Question {
            id: "q".into(),
            question_type: QuestionType::MultipleChoice,
            subject: "Math".into(),
            grade: "Grade 3".into(),
            content: "c".into(),
            difficulty: Difficulty::Easy,
            points: 10,
            hints: vec![],
            career_context: "Chef".into(),
            skill_id: skill_id.into(),
            options: None,
            correct_answer: None,
            visual: None,
            tolerance: None,
        }
    }

    #[test]
    fn mastery_weighs_recent_attempts_more_heavily() {
        let tracker = PerformanceTracker::new();
        // Early failures, recent successes.
        for _ in 0..3 {
            tracker.track_question_performance("u1", &question("s1"), false, 10, 0, 1);
        }
        for _ in 0..3 {
            tracker.track_question_performance("u1", &question("s1"), true, 10, 0, 1);
        }

        let mastery = tracker.calculate_mastery("u1", "s1").unwrap();
        assert!(mastery > 0.5, "recent correctness should dominate: {mastery}");
    }

    #[test]
    fn unknown_skill_has_no_mastery_reading() {
        let tracker = PerformanceTracker::new();
        assert!(tracker.calculate_mastery("u1", "never-attempted").is_none());
    }

    #[test]
    fn struggling_pattern_detected_on_low_accuracy() {
        let tracker = PerformanceTracker::new();
        for _ in 0..4 {
            tracker.track_question_performance("u2", &question("s2"), false, 10, 0, 1);
        }
        let weaknesses = tracker.get_weaknesses("u2");
        assert_eq!(weaknesses, vec!["s2".to_string()]);
    }
}
