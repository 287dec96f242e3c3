use adaptive_domain::{DailyLearningContext, DomainError};
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

/// Persistence boundary for daily contexts, used for session recovery after
/// a process restart.
#[async_trait]
pub trait DailyContextRepository: Send + Sync {
    async fn load(&self, student_id: &str, date: NaiveDate) -> Result<Option<DailyLearningContext>, DomainError>;
    async fn save(&self, context: &DailyLearningContext) -> Result<(), DomainError>;
}

/// Owns the immutable-for-the-day `(career, companion, primarySkill)` tuple
/// per student. First writer for `(studentId, today)` wins; every later call
/// for that pair returns the existing object untouched.
pub struct DailyLearningContextManager {
    repo: std::sync::Arc<dyn DailyContextRepository>,
    cache: DashMap<(String, NaiveDate), DailyLearningContext>,
}

impl DailyLearningContextManager {
    pub fn new(repo: std::sync::Arc<dyn DailyContextRepository>) -> Self {
        Self {
            repo,
            cache: DashMap::new(),
        }
    }

    pub async fn get_or_create_context(
        &self,
        student_id: &str,
        today: NaiveDate,
        career: &str,
        companion: &str,
        grade: &str,
        primary_skill: &str,
    ) -> DailyLearningContext {
        let key = (student_id.to_string(), today);

        if let Some(existing) = self.cache.get(&key) {
            return existing.clone();
        }

        if let Ok(Some(loaded)) = self.repo.load(student_id, today).await {
            self.cache.insert(key, loaded.clone());
            return loaded;
        }

        let context = DailyLearningContext {
            student_id: student_id.to_string(),
            date: today,
            primary_skill: primary_skill.to_string(),
            career: career.to_string(),
            companion: companion.to_string(),
            grade_level: grade.to_string(),
            subjects: adaptive_skills::BASE_SUBJECTS.iter().map(|s| s.to_string()).collect(),
        };

        // First-writer-wins: re-check after the await in case a concurrent
        // call on the owning event loop beat us to the insert.
        match self.cache.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(occupied) => occupied.get().clone(),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(context.clone());
                if let Err(err) = self.repo.save(&context).await {
                    tracing::warn!(%student_id, error = %err, "failed to persist daily learning context");
                }
                context
            }
        }
    }

    pub fn get_current_context(&self, student_id: &str, today: NaiveDate) -> Option<DailyLearningContext> {
        self.cache.get(&(student_id.to_string(), today)).map(|c| c.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct NullRepo;

    #[async_trait]
    impl DailyContextRepository for NullRepo {
        async fn load(&self, _student_id: &str, _date: NaiveDate) -> Result<Option<DailyLearningContext>, DomainError> {
            Ok(None)
        }
        async fn save(&self, _context: &DailyLearningContext) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingRepo {
        saved: Mutex<Vec<DailyLearningContext>>,
    }

    #[async_trait]
    impl DailyContextRepository for RecordingRepo {
        async fn load(&self, _student_id: &str, _date: NaiveDate) -> Result<Option<DailyLearningContext>, DomainError> {
            Ok(None)
        }
        async fn save(&self, context: &DailyLearningContext) -> Result<(), DomainError> {
            self.saved.lock().unwrap().push(context.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn second_call_returns_the_same_context_unchanged() {
        let manager = DailyLearningContextManager::new(std::sync::Arc::new(NullRepo));
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();

        let first = manager
            .get_or_create_context("student-1", today, "Chef", "Sprout", "Grade 3", "Counting to 10")
            .await;
        let second = manager
            .get_or_create_context("student-1", today, "Astronaut", "Pip", "Grade 3", "Something else")
            .await;

        assert_eq!(first, second);
        assert_eq!(second.career, "Chef");
    }

    #[tokio::test]
    async fn creation_is_persisted_exactly_once() {
        let repo = std::sync::Arc::new(RecordingRepo::default());
        let manager = DailyLearningContextManager::new(repo.clone());
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();

        manager
            .get_or_create_context("student-2", today, "Vet", "Sprout", "Grade 3", "Skip counting")
            .await;
        manager
            .get_or_create_context("student-2", today, "Vet", "Sprout", "Grade 3", "Skip counting")
            .await;

        assert_eq!(repo.saved.lock().unwrap().len(), 1);
    }
}
