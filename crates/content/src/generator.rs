use adaptive_domain::{Container, Difficulty, DomainError, Question, QuestionType, Scaffolding, SubjectContent, VolumeProfile};
use async_trait::async_trait;

/// Everything a generator needs to produce one subject's worth of content
/// for a container (§4.D.4 step 4).
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub student_id: String,
    pub grade: String,
    pub subject: String,
    pub skill_id: String,
    pub adapted_skill: String,
    pub career: String,
    pub container: Container,
    pub volume: VolumeProfile,
    pub scaffolding: Scaffolding,
}

/// The external content generator (§6 "Content generator (consumed)").
/// Opaque, async, assumed non-deterministic — callers must validate its
/// output rather than trust it.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &ContentRequest) -> Result<SubjectContent, DomainError>;
}

/// Deterministic, template-based generator used when the real generator
/// times out or errors. Must cover every `(grade, subject)` combination and
/// must never return an empty question set (§4.D.4 Contract).
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackContentProvider;

impl FallbackContentProvider {
    pub fn new() -> Self {
        Self
    }

    fn difficulty_for(scaffolding: Scaffolding, index: u32, total: u32) -> Difficulty {
        match scaffolding {
            Scaffolding::Extra => Difficulty::Easy,
            _ => {
                if index + 1 == total {
                    Difficulty::Hard
                } else if index * 2 >= total {
                    Difficulty::Medium
                } else {
                    Difficulty::Easy
                }
            }
        }
    }
}

#[async_trait]
impl ContentGenerator for FallbackContentProvider {
    async fn generate(&self, request: &ContentRequest) -> Result<SubjectContent, DomainError> {
        let total = request.volume.total_questions().max(1);
        let mut questions = Vec::with_capacity(total as usize);

        for i in 0..total {
            let difficulty = Self::difficulty_for(request.scaffolding, i, total);
            questions.push(Question {
                id: format!("{}-{}-{}-{}", request.student_id, request.subject, request.skill_id, i),
                question_type: QuestionType::MultipleChoice,
                subject: request.subject.clone(),
                grade: request.grade.clone(),
                content: format!(
                    "As a {}, practice #{}: {}",
                    request.career,
                    i + 1,
                    request.adapted_skill
                ),
                difficulty,
                points: 10,
                hints: Vec::new(),
                career_context: request.career.clone(),
                skill_id: request.skill_id.clone(),
                options: Some(vec![
                    "Option A".to_string(),
                    "Option B".to_string(),
                    "Option C".to_string(),
                    "Option D".to_string(),
                ]),
                correct_answer: Some("Option A".to_string()),
                visual: None,
                tolerance: None,
            });
        }

        Ok(SubjectContent {
            subject: request.subject.clone(),
            adapted_skill: request.adapted_skill.clone(),
            questions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_domain::VolumeMode;

    fn request(mode: VolumeMode, scaffolding: Scaffolding) -> ContentRequest {
        ContentRequest {
            student_id: "student-1".to_string(),
            grade: "Grade 3".to_string(),
            subject: "Math".to_string(),
            skill_id: "g3-math-b1".to_string(),
            adapted_skill: "Add multi-digit numbers".to_string(),
            career: "Chef".to_string(),
            container: Container::Learn,
            volume: VolumeProfile::for_mode(mode),
            scaffolding,
        }
    }

    #[tokio::test]
    async fn never_returns_an_empty_question_set() {
        let provider = FallbackContentProvider::new();
        for mode in [VolumeMode::Demo, VolumeMode::Testing, VolumeMode::Standard, VolumeMode::Full] {
            let content = provider
                .generate(&request(mode, Scaffolding::Standard))
                .await
                .unwrap();
            assert!(!content.questions.is_empty());
            assert_eq!(content.questions.len() as u32, VolumeProfile::for_mode(mode).total_questions());
        }
    }

    #[tokio::test]
    async fn every_question_has_a_distinct_fingerprint() {
        let provider = FallbackContentProvider::new();
        let content = provider
            .generate(&request(VolumeMode::Standard, Scaffolding::Standard))
            .await
            .unwrap();
        let mut fingerprints: Vec<String> = content.questions.iter().map(|q| q.fingerprint()).collect();
        fingerprints.sort();
        fingerprints.dedup();
        assert_eq!(fingerprints.len(), content.questions.len());
    }

    #[tokio::test]
    async fn extra_scaffolding_keeps_everything_easy() {
        let provider = FallbackContentProvider::new();
        let content = provider
            .generate(&request(VolumeMode::Standard, Scaffolding::Extra))
            .await
            .unwrap();
        assert!(content.questions.iter().all(|q| q.difficulty == Difficulty::Easy));
    }
}
