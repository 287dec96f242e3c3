use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use adaptive_domain::{
    Container, DomainError, MultiSubjectContent, Scaffolding, SubjectContent,
    SubjectPerformanceSnapshot, VolumeMode, VolumeProfile,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::consistency::ConsistencyValidator;
use crate::daily_context::DailyLearningContextManager;
use crate::generator::{ContentGenerator, ContentRequest, FallbackContentProvider};
use crate::question_registry::QuestionTypeRegistry;
use crate::session_state::SessionStateManager;
use crate::skill_adaptation::SkillAdaptationService;

/// In-memory cache TTL (§4.D.4 Caching, tier 1).
const CACHE_TTL_MINUTES: i64 = 30;

/// One subject's skill assignment for the container being generated, as
/// handed down by the Adaptive Journey Engine / Container Mediator.
#[derive(Debug, Clone)]
pub struct SubjectAssignment {
    pub subject: String,
    pub skill_id: String,
}

/// Everything needed to generate one container's worth of content.
#[derive(Debug, Clone)]
pub struct GenerateContainerRequest {
    pub user_id: String,
    pub container: Container,
    pub subjects: Vec<SubjectAssignment>,
    pub grade: String,
    pub career: String,
    pub companion: String,
    pub primary_skill: String,
    pub volume_mode: VolumeMode,
    pub performance: Option<HashMap<String, SubjectPerformanceSnapshot>>,
}

struct CacheEntry {
    content: MultiSubjectContent,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.cached_at).num_minutes() >= CACHE_TTL_MINUTES
    }
}

/// Ties together the content pipeline's sub-services into the public
/// `generateContainerContent` contract (§4.D.4).
pub struct JustInTimeContentService {
    daily_context: Arc<DailyLearningContextManager>,
    sessions: Arc<SessionStateManager>,
    skill_adaptation: SkillAdaptationService,
    consistency: ConsistencyValidator,
    registry: QuestionTypeRegistry,
    generator: Arc<dyn ContentGenerator>,
    fallback: Arc<dyn ContentGenerator>,
    generation_timeout: Duration,
    cache: DashMap<(String, chrono::NaiveDate, Container), CacheEntry>,
}

impl JustInTimeContentService {
    pub fn new(
        daily_context: Arc<DailyLearningContextManager>,
        sessions: Arc<SessionStateManager>,
        generator: Arc<dyn ContentGenerator>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            daily_context,
            sessions,
            skill_adaptation: SkillAdaptationService::new(),
            consistency: ConsistencyValidator::new(),
            registry: QuestionTypeRegistry::new(),
            generator,
            fallback: Arc::new(FallbackContentProvider::new()),
            generation_timeout,
            cache: DashMap::new(),
        }
    }

    pub fn invalidate(&self, user_id: &str) {
        self.cache.retain(|(cached_user, _, _), _| cached_user != user_id);
    }

    pub async fn generate_container_content(
        &self,
        request: GenerateContainerRequest,
    ) -> Result<MultiSubjectContent, DomainError> {
        if !self.sessions.validate_progression(&request.user_id, request.container) {
            return Err(DomainError::ProgressionError(format!(
                "container {:?} entered out of order for user {}",
                request.container, request.user_id
            )));
        }

        let today = Utc::now().date_naive();
        let cache_key = (request.user_id.clone(), today, request.container);

        if let Some(entry) = self.cache.get(&cache_key) {
            if !entry.is_stale(Utc::now()) {
                return Ok(entry.content.clone());
            }
        }

        let context = self
            .daily_context
            .get_or_create_context(
                &request.user_id,
                today,
                &request.career,
                &request.companion,
                &request.grade,
                &request.primary_skill,
            )
            .await;

        let volume = VolumeProfile::for_mode(request.volume_mode);
        let mut subject_contents = Vec::with_capacity(request.subjects.len());

        for assignment in &request.subjects {
            let scaffolding = request
                .performance
                .as_ref()
                .and_then(|perf| perf.get(&assignment.subject))
                .map(|snapshot| snapshot.scaffolding())
                .unwrap_or(Scaffolding::Standard);

            let adapted_skill = self
                .skill_adaptation
                .adapt_skill_to_subject(&context.primary_skill, &assignment.subject);

            let content_request = ContentRequest {
                student_id: request.user_id.clone(),
                grade: request.grade.clone(),
                subject: assignment.subject.clone(),
                skill_id: assignment.skill_id.clone(),
                adapted_skill,
                career: context.career.clone(),
                container: request.container,
                volume,
                scaffolding,
            };

            let mut generated = self.call_generator_with_fallback(&content_request).await?;
            self.apply_consistency_checks(&mut generated, &context.career, &context.primary_skill);
            self.registry.validate_no_duplicates(&generated.questions)?;

            subject_contents.push(generated);
        }

        let content = MultiSubjectContent {
            user_id: request.user_id.clone(),
            container: request.container,
            career: context.career,
            primary_skill: context.primary_skill,
            subjects: subject_contents,
            generated_at: Utc::now(),
        };

        self.cache.insert(
            cache_key,
            CacheEntry {
                content: content.clone(),
                cached_at: Utc::now(),
            },
        );

        Ok(content)
    }

    async fn call_generator_with_fallback(
        &self,
        request: &ContentRequest,
    ) -> Result<SubjectContent, DomainError> {
        match tokio::time::timeout(self.generation_timeout, self.generator.generate(request)).await {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, subject = %request.subject, "content generator failed, using fallback");
                self.fallback.generate(request).await
            }
            Err(_) => {
                tracing::warn!(subject = %request.subject, "content generator timed out, using fallback");
                self.fallback.generate(request).await
            }
        }
    }

    fn apply_consistency_checks(&self, content: &mut SubjectContent, career: &str, primary_skill: &str) {
        for question in &mut content.questions {
            let outcome = self.consistency.validate_career_context(&question.content, career);
            if let Some(corrected) = outcome.corrected {
                tracing::info!(question_id = %question.id, "consistency_repair: career context corrected");
                question.content = corrected;
            }

            let focus = self.consistency.validate_skill_focus(&question.content, primary_skill);
            if !focus.valid {
                tracing::debug!(question_id = %question.id, violations = ?focus.violations, "skill focus drift detected");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daily_context::DailyContextRepository;
    use adaptive_domain::DailyLearningContext;
    use async_trait::async_trait;

    struct NullRepo;

    #[async_trait]
    impl DailyContextRepository for NullRepo {
        async fn load(&self, _student_id: &str, _date: chrono::NaiveDate) -> Result<Option<DailyLearningContext>, DomainError> {
            Ok(None)
        }
        async fn save(&self, _context: &DailyLearningContext) -> Result<(), DomainError> {
            Ok(())
        }
    }

    fn service() -> JustInTimeContentService {
        let daily_context = Arc::new(DailyLearningContextManager::new(Arc::new(NullRepo)));
        let sessions = Arc::new(SessionStateManager::new());
        let generator: Arc<dyn ContentGenerator> = Arc::new(FallbackContentProvider::new());
        JustInTimeContentService::new(daily_context, sessions, generator, Duration::from_millis(8000))
    }

    fn request(user_id: &str, container: Container) -> GenerateContainerRequest {
        GenerateContainerRequest {
            user_id: user_id.to_string(),
            container,
            subjects: vec![SubjectAssignment { subject: "Math".to_string(), skill_id: "g3-math-b1".to_string() }],
            grade: "Grade 3".to_string(),
            career: "Chef".to_string(),
            companion: "Sprout".to_string(),
            primary_skill: "Add multi-digit numbers".to_string(),
            volume_mode: VolumeMode::Demo,
            performance: None,
        }
    }

    #[tokio::test]
    async fn rejects_out_of_order_container_entry() {
        let service = service();
        let result = service
            .generate_container_content(request("u1", Container::Experience))
            .await;
        assert!(matches!(result, Err(DomainError::ProgressionError(_))));
    }

    #[tokio::test]
    async fn generates_and_caches_content_for_learn() {
        let service = service();
        let first = service
            .generate_container_content(request("u2", Container::Learn))
            .await
            .unwrap();
        assert!(!first.subjects.is_empty());
        assert!(!first.subjects[0].questions.is_empty());

        let second = service
            .generate_container_content(request("u2", Container::Learn))
            .await
            .unwrap();
        assert_eq!(first.generated_at, second.generated_at, "cache hit should return the same object");
    }

    #[tokio::test]
    async fn invalidate_clears_the_cache_for_a_user() {
        let service = service();
        let first = service
            .generate_container_content(request("u3", Container::Learn))
            .await
            .unwrap();

        service.invalidate("u3");

        let second = service
            .generate_container_content(request("u3", Container::Learn))
            .await
            .unwrap();
        assert_ne!(first.generated_at, second.generated_at);
    }
}
