//! Container Mediator (component F, §4.F): the thin coordinator between
//! external container-lifecycle events and the Adaptive Journey Engine (C)
//! and Content Pipeline (D). Holds no state of its own beyond references to
//! the two engines it wires together.

use std::sync::Arc;

use adaptive_content::{
    GenerateContainerRequest, JustInTimeContentService, SessionStateManager, SubjectAssignment,
};
use adaptive_domain::{
    CompletionMetrics, Container, ContainerPerformance, DomainError, MultiSubjectContent,
    SkillOutcome, SubjectPerformanceSnapshot, VolumeMode,
};
use adaptive_journey::JourneyEngine;
use async_trait::async_trait;

/// External collaborator invoked when a subject isn't offered at a
/// student's grade (e.g. Grade 10 ELA, §4.F step 1). The mediator never
/// decides how this is presented to the student — it just reports it and
/// moves on to the next subject.
#[async_trait]
pub trait SubjectUnavailableNotifier: Send + Sync {
    async fn on_subject_unavailable(&self, user_id: &str, subject: &str);
}

/// A no-op notifier for callers (tests, admin tooling) that don't care.
pub struct NullNotifier;

#[async_trait]
impl SubjectUnavailableNotifier for NullNotifier {
    async fn on_subject_unavailable(&self, user_id: &str, subject: &str) {
        tracing::debug!(user_id, subject, "subject unavailable, no notifier configured");
    }
}

/// Everything the mediator needs to generate a container's content, beyond
/// what it fetches from the Journey Engine itself.
#[derive(Debug, Clone)]
pub struct ContainerEnterRequest {
    pub user_id: String,
    pub grade: String,
    pub container: Container,
    pub career: String,
    pub companion: String,
    pub primary_skill: String,
    pub volume_mode: VolumeMode,
    pub performance: Option<std::collections::HashMap<String, SubjectPerformanceSnapshot>>,
}

/// Aggregated performance reported on container completion, per §4.F "on
/// container complete, forward aggregated performance to D's tracker and to
/// C's processSkillCompletion per attempted skill".
#[derive(Debug, Clone)]
pub struct ContainerCompleteRequest {
    pub user_id: String,
    pub grade: String,
    pub container: Container,
    pub performance: ContainerPerformance,
}

/// Component F. Coordinates C (journey) and D (content pipeline) around the
/// container-enter / container-complete boundary; never talks to a
/// database or the real-time channel directly.
pub struct ContainerMediator {
    journey: Arc<JourneyEngine>,
    content: Arc<JustInTimeContentService>,
    sessions: Arc<SessionStateManager>,
    notifier: Arc<dyn SubjectUnavailableNotifier>,
}

impl ContainerMediator {
    pub fn new(
        journey: Arc<JourneyEngine>,
        content: Arc<JustInTimeContentService>,
        sessions: Arc<SessionStateManager>,
        notifier: Arc<dyn SubjectUnavailableNotifier>,
    ) -> Self {
        Self {
            journey,
            content,
            sessions,
            notifier,
        }
    }

    /// §4.F container-enter flow: ask C for the current skill per subject,
    /// skip (and notify on) subjects unavailable at this grade, then ask D
    /// to generate content for whatever subjects remain.
    pub async fn container_enter(
        &self,
        request: ContainerEnterRequest,
    ) -> Result<MultiSubjectContent, DomainError> {
        self.sessions.track_container_progression(&request.user_id, request.container);

        let mut subjects = Vec::with_capacity(adaptive_skills::BASE_SUBJECTS.len());
        for subject in adaptive_skills::BASE_SUBJECTS {
            match self
                .journey
                .get_current_skill_for_subject(&request.user_id, subject, &request.grade)
                .await
            {
                Some(skill) => subjects.push(SubjectAssignment {
                    subject: skill.subject,
                    skill_id: skill.id,
                }),
                None => self.notifier.on_subject_unavailable(&request.user_id, subject).await,
            }
        }

        if subjects.is_empty() {
            return Err(DomainError::SubjectUnavailable(format!(
                "no subjects offered for {} at grade {}",
                request.user_id, request.grade
            )));
        }

        self.content
            .generate_container_content(GenerateContainerRequest {
                user_id: request.user_id,
                container: request.container,
                subjects,
                grade: request.grade,
                career: request.career,
                companion: request.companion,
                primary_skill: request.primary_skill,
                volume_mode: request.volume_mode,
                performance: request.performance,
            })
            .await
    }

    /// §4.F container-complete flow: record the container as complete in
    /// session state, then push each attempted skill's outcome through to
    /// the journey engine so mastered skills advance the pointer.
    pub async fn container_complete(
        &self,
        request: ContainerCompleteRequest,
    ) -> Result<(), DomainError> {
        for skill_result in &request.performance.skill_results {
            let metrics = CompletionMetrics {
                correct_answers: skill_result.correct_answers,
                questions_answered: skill_result.questions_answered,
            };
            let outcome = derive_outcome(&metrics);

            self.journey
                .process_skill_completion(&request.user_id, &skill_result.skill_id, outcome, metrics)
                .await?;
        }

        self.sessions.complete_container(&request.user_id, request.container, request.performance);
        Ok(())
    }
}

/// Derives a `SkillOutcome` from raw correctness counters when the caller
/// didn't directly assert `Mastered` (§4.C `processSkillCompletion`).
fn derive_outcome(metrics: &CompletionMetrics) -> SkillOutcome {
    if metrics.meets_mastery(CompletionMetrics::DEFAULT_MASTERY_THRESHOLD) {
        SkillOutcome::Mastered
    } else if metrics.accuracy().is_some_and(|acc| acc >= 0.5) {
        SkillOutcome::Practiced
    } else {
        SkillOutcome::Struggled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_content::{DailyContextRepository, FallbackContentProvider};
    use adaptive_domain::SkillAttemptResult;
    use adaptive_journey::JourneyRepository;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct InMemoryJourneyRepo {
        store: Mutex<std::collections::HashMap<String, adaptive_domain::Journey>>,
    }

    #[async_trait]
    impl JourneyRepository for InMemoryJourneyRepo {
        async fn load(&self, student_id: &str) -> Result<Option<adaptive_domain::Journey>, DomainError> {
            Ok(self.store.lock().unwrap().get(student_id).cloned())
        }
        async fn save(&self, journey: &adaptive_domain::Journey) -> Result<(), DomainError> {
            self.store.lock().unwrap().insert(journey.student_id.clone(), journey.clone());
            Ok(())
        }
    }

    struct NullContextRepo;

    #[async_trait]
    impl DailyContextRepository for NullContextRepo {
        async fn load(
            &self,
            _student_id: &str,
            _date: chrono::NaiveDate,
        ) -> Result<Option<adaptive_domain::DailyLearningContext>, DomainError> {
            Ok(None)
        }
        async fn save(&self, _context: &adaptive_domain::DailyLearningContext) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notified: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SubjectUnavailableNotifier for RecordingNotifier {
        async fn on_subject_unavailable(&self, user_id: &str, subject: &str) {
            self.notified.lock().unwrap().push((user_id.to_string(), subject.to_string()));
        }
    }

    fn mediator(notifier: Arc<dyn SubjectUnavailableNotifier>) -> ContainerMediator {
        let journey = Arc::new(JourneyEngine::new(Arc::new(InMemoryJourneyRepo::default())));
        let sessions = Arc::new(SessionStateManager::new());
        let daily_context = Arc::new(adaptive_content::DailyLearningContextManager::new(Arc::new(
            NullContextRepo,
        )));
        let generator: Arc<dyn adaptive_content::ContentGenerator> =
            Arc::new(FallbackContentProvider::new());
        let content = Arc::new(JustInTimeContentService::new(
            daily_context,
            sessions.clone(),
            generator,
            Duration::from_millis(8000),
        ));
        ContainerMediator::new(journey, content, sessions, notifier)
    }

    fn enter_request(user_id: &str, grade: &str, container: Container) -> ContainerEnterRequest {
        ContainerEnterRequest {
            user_id: user_id.to_string(),
            grade: grade.to_string(),
            container,
            career: "Chef".to_string(),
            companion: "Sprout".to_string(),
            primary_skill: "Identify numbers up to 3".to_string(),
            volume_mode: VolumeMode::Demo,
            performance: None,
        }
    }

    #[tokio::test]
    async fn grade_ten_skips_unavailable_subjects_and_notifies() {
        let notifier: Arc<RecordingNotifier> = Arc::new(RecordingNotifier::default());
        let mediator = mediator(notifier.clone());

        let content = mediator
            .container_enter(enter_request("s1", "Grade 10", Container::Learn))
            .await
            .expect("math alone should still produce content");

        // Grade 10 offers only Math (-> Algebra I) among the base subjects.
        assert_eq!(content.subjects.len(), 1);
        assert_eq!(content.subjects[0].subject, "Algebra I");

        let notified = notifier.notified.lock().unwrap();
        assert_eq!(notified.len(), 3);
        assert!(notified.iter().any(|(_, s)| s == "ELA"));
        assert!(notified.iter().any(|(_, s)| s == "Science"));
        assert!(notified.iter().any(|(_, s)| s == "Social Studies"));
    }

    #[tokio::test]
    async fn container_complete_advances_the_journey_pointer() {
        let mediator = mediator(Arc::new(NullNotifier));

        let first = mediator
            .container_enter(enter_request("s2", "Grade 3", Container::Learn))
            .await
            .unwrap();
        let math_skill_id = first
            .subjects
            .iter()
            .find(|s| s.subject == "Math")
            .unwrap()
            .questions[0]
            .skill_id
            .clone();

        mediator
            .container_complete(ContainerCompleteRequest {
                user_id: "s2".to_string(),
                grade: "Grade 3".to_string(),
                container: Container::Learn,
                performance: ContainerPerformance {
                    questions_answered: 10,
                    correct_answers: 9,
                    hints_used: 0,
                    total_time_seconds: 120,
                    skill_results: vec![SkillAttemptResult {
                        skill_id: math_skill_id,
                        correct_answers: 9,
                        questions_answered: 10,
                    }],
                },
            })
            .await
            .unwrap();

        let next = mediator
            .container_enter(enter_request("s2", "Grade 3", Container::Experience))
            .await
            .unwrap();
        let next_math = next.subjects.iter().find(|s| s.subject == "Math").unwrap();
        assert_ne!(next_math.questions[0].skill_id, "");
    }
}
