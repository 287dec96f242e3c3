use std::sync::Arc;

use adaptive_domain::{
    Assignment, ClusterProgress, CompletionMetrics, DomainError, Journey, Skill, SkillOutcome,
    SubjectProgress,
};
use adaptive_skills::{SkillClusterService, BASE_SUBJECTS};
use chrono::Utc;
use dashmap::{DashMap, DashSet};

use crate::repository::JourneyRepository;

/// Next cluster prefix in the A, B, C, ... sequence.
fn next_prefix(prefix: &str) -> String {
    match prefix.chars().next() {
        Some(c) => char::from_u32(c as u32 + 1).unwrap_or(c).to_string(),
        None => "A".to_string(),
    }
}

/// The Adaptive Journey Engine (component C): owns the per-(student,
/// subject) state machine described in §4.C. Keeps an in-memory cache of
/// journeys so a persistence failure never loses a mutation — the engine
/// retains its copy and retries the write on the next operation touching
/// that student.
pub struct JourneyEngine {
    skills: SkillClusterService,
    repo: Arc<dyn JourneyRepository>,
    cache: DashMap<String, Journey>,
    dirty: DashSet<String>,
}

impl JourneyEngine {
    pub fn new(repo: Arc<dyn JourneyRepository>) -> Self {
        Self {
            skills: SkillClusterService::new(),
            repo,
            cache: DashMap::new(),
            dirty: DashSet::new(),
        }
    }

    async fn save_with_retry(&self, journey: &Journey) {
        match self.repo.save(journey).await {
            Ok(()) => {
                self.dirty.remove(&journey.student_id);
            }
            Err(err) => {
                tracing::warn!(
                    student_id = %journey.student_id,
                    error = %err,
                    "journey persistence failed, retaining in-memory state for retry"
                );
                self.dirty.insert(journey.student_id.clone());
            }
        }
    }

    /// Retries a previously failed write for this student before doing any
    /// new work, so persistence failures heal on the next call rather than
    /// piling up silently.
    async fn flush_dirty(&self, student_id: &str) {
        if self.dirty.contains(student_id) {
            if let Some(journey) = self.cache.get(student_id) {
                let journey = journey.clone();
                self.save_with_retry(&journey).await;
            }
        }
    }

    pub async fn get_or_init_journey(&self, student_id: &str, grade: &str) -> Journey {
        self.flush_dirty(student_id).await;

        if let Some(existing) = self.cache.get(student_id) {
            return existing.clone();
        }

        if let Ok(Some(loaded)) = self.repo.load(student_id).await {
            self.cache.insert(student_id.to_string(), loaded.clone());
            return loaded;
        }

        let normalized_grade = self.skills.normalize_grade(grade);
        let journey = Journey::new(student_id, normalized_grade, Utc::now());
        self.cache.insert(student_id.to_string(), journey.clone());
        self.save_with_retry(&journey).await;
        journey
    }

    /// Idempotent. Returns `None` if the subject is not offered at this
    /// grade; `Some(())` whether the subject was just started or was
    /// already in progress.
    pub async fn start_subject_journey(
        &self,
        student_id: &str,
        subject: &str,
        grade: &str,
    ) -> Option<()> {
        let grade = self.skills.normalize_grade(grade);
        let mapped = self.skills.map_subject_for_grade(subject, &grade)?;
        let mut journey = self.get_or_init_journey(student_id, &grade).await;

        if journey.subject_progress.contains_key(&mapped) {
            return Some(());
        }

        let diagnostic = self.skills.get_diagnostic_cluster(&grade, &mapped)?;
        let cluster_progress = ClusterProgress::new("A", diagnostic.skill_ids());
        let progress = SubjectProgress::new(mapped.clone(), "A", cluster_progress, Utc::now());
        journey.subject_progress.insert(mapped, progress);

        self.cache.insert(student_id.to_string(), journey.clone());
        self.save_with_retry(&journey).await;
        Some(())
    }

    /// Returns the skill at the current pointer without advancing it.
    /// Initializes the subject's diagnostic cluster on first call. Never
    /// throws for a subject unavailable at this grade — propagates `None`.
    pub async fn get_current_skill_for_subject(
        &self,
        student_id: &str,
        subject: &str,
        grade: &str,
    ) -> Option<Skill> {
        self.start_subject_journey(student_id, subject, grade).await?;
        let grade = self.skills.normalize_grade(grade);
        let mapped = self.skills.map_subject_for_grade(subject, &grade)?;

        let journey = self.cache.get(student_id)?;
        let progress = journey.subject_progress.get(&mapped)?;
        let skill_id = progress.cluster_progress.current_skill_id()?;
        self.skills.get_skill_by_id(skill_id)
    }

    /// Advances the pointer past any skills already mastered, then returns
    /// whatever skill remains current. Used after a completion is committed,
    /// as opposed to `get_current_skill_for_subject`'s idempotent read.
    pub async fn get_next_skill(
        &self,
        student_id: &str,
        subject: &str,
        grade: &str,
    ) -> Option<Skill> {
        self.start_subject_journey(student_id, subject, grade).await?;
        let grade = self.skills.normalize_grade(grade);
        let mapped = self.skills.map_subject_for_grade(subject, &grade)?;

        let mut journey = self.cache.get(student_id)?.clone();
        let progress = journey.subject_progress.get_mut(&mapped)?;

        while let Some(skill_id) = progress.cluster_progress.current_skill_id() {
            if progress.cluster_progress.skills_mastered.contains(skill_id) {
                progress.cluster_progress.current_index += 1;
            } else {
                break;
            }
        }

        let result = progress
            .cluster_progress
            .current_skill_id()
            .and_then(|id| self.skills.get_skill_by_id(id));

        self.cache.insert(student_id.to_string(), journey.clone());
        self.save_with_retry(&journey).await;
        result
    }

    /// Commits the outcome of one skill attempt: records it in
    /// `skillsAttempted`, promotes to `skillsMastered` when the outcome (or
    /// derived accuracy) clears the mastery threshold, advances the cluster
    /// pointer, and rolls the cluster prefix forward (or marks the subject
    /// mastered) once the cluster is exhausted.
    pub async fn process_skill_completion(
        &self,
        student_id: &str,
        skill_id: &str,
        outcome: SkillOutcome,
        metrics: CompletionMetrics,
    ) -> Result<(), DomainError> {
        let skill = self
            .skills
            .get_skill_by_id(skill_id)
            .ok_or_else(|| DomainError::ProgressionError(format!("unknown skill {skill_id}")))?;

        let mut journey = self
            .cache
            .get(student_id)
            .map(|j| j.clone())
            .ok_or_else(|| DomainError::NotFound(format!("no journey for {student_id}")))?;

        let grade = journey.grade_level.clone();
        let progress = journey
            .subject_progress
            .get_mut(&skill.subject)
            .ok_or_else(|| {
                DomainError::ProgressionError(format!("subject {} not started", skill.subject))
            })?;

        progress.cluster_progress.skills_attempted.insert(skill_id.to_string());

        let mastered = outcome == SkillOutcome::Mastered
            || metrics.meets_mastery(CompletionMetrics::DEFAULT_MASTERY_THRESHOLD);

        if mastered {
            progress.cluster_progress.skills_mastered.insert(skill_id.to_string());
            progress.total_skills_mastered += 1;

            if progress.cluster_progress.current_skill_id() == Some(&skill_id.to_string()) {
                progress.cluster_progress.current_index += 1;
            }

            if progress.cluster_progress.is_exhausted() {
                let advanced_prefix = next_prefix(&progress.current_cluster_prefix);
                match self.skills.load_cluster(&grade, &skill.subject, &advanced_prefix) {
                    Some(cluster) => {
                        progress.current_cluster_prefix = advanced_prefix.clone();
                        progress.cluster_progress =
                            ClusterProgress::new(advanced_prefix, cluster.skill_ids());
                    }
                    None => {
                        progress.mastered = true;
                    }
                }
            }
        }

        progress.last_activity_at = Utc::now();

        self.cache.insert(student_id.to_string(), journey.clone());
        self.save_with_retry(&journey).await;
        Ok(())
    }

    /// One active assignment per offered subject for this grade.
    pub async fn get_continuous_assignments(&self, student_id: &str, grade: &str) -> Vec<Assignment> {
        let mut assignments = Vec::new();
        let normalized_grade = self.skills.normalize_grade(grade);

        for subject in BASE_SUBJECTS {
            let Some(skill) = self.get_current_skill_for_subject(student_id, subject, grade).await
            else {
                continue;
            };
            let mapped = match self.skills.map_subject_for_grade(subject, &normalized_grade) {
                Some(m) => m,
                None => continue,
            };

            let cluster_prefix = self
                .cache
                .get(student_id)
                .and_then(|j| j.subject_progress.get(&mapped).map(|p| p.current_cluster_prefix.clone()))
                .unwrap_or_else(|| "A".to_string());

            assignments.push(Assignment {
                subject: mapped,
                skill_id: skill.id,
                skill_name: skill.skill_name,
                cluster_prefix,
            });
        }

        assignments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryRepo {
        store: Mutex<std::collections::HashMap<String, Journey>>,
    }

    #[async_trait]
    impl JourneyRepository for InMemoryRepo {
        async fn load(&self, student_id: &str) -> Result<Option<Journey>, DomainError> {
            Ok(self.store.lock().unwrap().get(student_id).cloned())
        }
        async fn save(&self, journey: &Journey) -> Result<(), DomainError> {
            self.store
                .lock()
                .unwrap()
                .insert(journey.student_id.clone(), journey.clone());
            Ok(())
        }
    }

    fn engine() -> JourneyEngine {
        JourneyEngine::new(Arc::new(InMemoryRepo::default()))
    }

    #[tokio::test]
    async fn unoffered_subject_returns_none_without_panicking() {
        let engine = engine();
        let skill = engine
            .get_current_skill_for_subject("student-1", "ELA", "Grade 10")
            .await;
        assert!(skill.is_none());
    }

    #[tokio::test]
    async fn first_call_initializes_diagnostic_cluster() {
        let engine = engine();
        let skill = engine
            .get_current_skill_for_subject("student-1", "Math", "Grade 3")
            .await
            .expect("diagnostic skill");
        assert_eq!(skill.cluster_prefix(), "A");
    }

    #[tokio::test]
    async fn unnormalized_grade_still_resolves_to_algebra_i() {
        // §8 end-to-end scenario 1 passes the bare grade "10", not "Grade 10".
        let engine = engine();
        let skill = engine
            .get_current_skill_for_subject("student-10", "Math", "10")
            .await
            .expect("grade 10 math should map to Algebra I");
        assert_eq!(skill.subject, "Algebra I");
        assert_eq!(skill.skill_number, "A.1");
    }

    #[tokio::test]
    async fn mastering_every_skill_in_a_cluster_advances_the_prefix() {
        let engine = engine();
        let student = "student-2";
        let grade = "Grade 3";
        let subject = "Math";

        // Finish the diagnostic cluster ("A": 2 skills).
        for _ in 0..2 {
            let skill = engine
                .get_current_skill_for_subject(student, subject, grade)
                .await
                .unwrap();
            engine
                .process_skill_completion(
                    student,
                    &skill.id,
                    SkillOutcome::Mastered,
                    CompletionMetrics { correct_answers: 10, questions_answered: 10 },
                )
                .await
                .unwrap();
        }

        let next = engine
            .get_current_skill_for_subject(student, subject, grade)
            .await
            .expect("cluster B skill");
        assert_eq!(next.cluster_prefix(), "B");
    }

    #[tokio::test]
    async fn mastering_the_final_cluster_marks_subject_mastered() {
        let engine = engine();
        let student = "student-3";
        let grade = "Grade 3";
        let subject = "Math";

        // Grade 3 Math has clusters A (2 skills), B (3 skills), C (1 skill).
        for _ in 0..6 {
            let skill = match engine
                .get_current_skill_for_subject(student, subject, grade)
                .await
            {
                Some(s) => s,
                None => break,
            };
            engine
                .process_skill_completion(
                    student,
                    &skill.id,
                    SkillOutcome::Mastered,
                    CompletionMetrics { correct_answers: 10, questions_answered: 10 },
                )
                .await
                .unwrap();
        }

        let journey = engine.get_or_init_journey(student, grade).await;
        let progress = journey.subject_progress.get("Math").unwrap();
        assert!(progress.mastered);
    }

    #[tokio::test]
    async fn continuous_assignments_skip_unoffered_subjects() {
        let engine = engine();
        let assignments = engine
            .get_continuous_assignments("student-4", "Grade 10")
            .await;

        // At Grade 10: Math -> Algebra I offered, ELA/Science/Social Studies are not.
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].subject, "Algebra I");
    }
}
