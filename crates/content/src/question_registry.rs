use std::collections::HashSet;

use adaptive_domain::{DomainError, Question, QuestionType};

/// Type-driven validation rules for generated questions and submitted
/// answers (§4.D.6).
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionTypeRegistry;

impl QuestionTypeRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Subject-type compatibility rules.
    pub fn is_allowed_for_subject(&self, question_type: QuestionType, subject: &str) -> bool {
        match subject {
            "ELA" => !matches!(question_type, QuestionType::Counting),
            "Math" => matches!(
                question_type,
                QuestionType::Counting | QuestionType::Numeric | QuestionType::MultipleChoice
            ),
            _ => true,
        }
    }

    /// No two questions in the same content block may share a fingerprint.
    pub fn validate_no_duplicates(&self, questions: &[Question]) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for question in questions {
            if !seen.insert(question.fingerprint()) {
                return Err(DomainError::ConsistencyViolation(format!(
                    "duplicate question detected: {}",
                    question.id
                )));
            }
        }
        Ok(())
    }

    /// Validates a submitted answer against a question's type-specific rule.
    /// Returns `Ok(is_correct)`; `Err` only for structurally invalid
    /// questions (e.g. a counting question with no visual).
    pub fn validate_answer(&self, question: &Question, user_input: &str) -> Result<bool, DomainError> {
        match question.question_type {
            QuestionType::Counting => {
                let visual = question
                    .visual
                    .as_deref()
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| {
                        DomainError::ConsistencyViolation(format!(
                            "counting question {} has no visual",
                            question.id
                        ))
                    })?;
                let count = visual.split_whitespace().filter(|t| !t.is_empty()).count();
                let submitted = user_input.trim().parse::<usize>().ok();
                Ok(submitted == Some(count))
            }
            QuestionType::MultipleChoice => {
                let correct_text = question.correct_answer.as_deref().unwrap_or_default();
                let trimmed_input = user_input.trim();

                if let Some(options) = &question.options {
                    if let Ok(index) = trimmed_input.parse::<usize>() {
                        if let Some(option) = options.get(index) {
                            return Ok(option.eq_ignore_ascii_case(correct_text.trim()));
                        }
                    }
                }
                Ok(trimmed_input.eq_ignore_ascii_case(correct_text.trim()))
            }
            QuestionType::Numeric => {
                let tolerance = question.tolerance.unwrap_or(0.0);
                let correct: f64 = question
                    .correct_answer
                    .as_deref()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(f64::NAN);
                let submitted: Option<f64> = user_input.trim().parse().ok();
                Ok(submitted.is_some_and(|v| (v - correct).abs() <= tolerance))
            }
            QuestionType::TrueFalse => {
                let expected = normalize_truthy(question.correct_answer.as_deref().unwrap_or("true"));
                let actual = normalize_truthy(user_input);
                Ok(expected == actual)
            }
            _ => {
                let correct = question.correct_answer.as_deref().unwrap_or_default();
                Ok(user_input.trim().eq_ignore_ascii_case(correct.trim()))
            }
        }
    }
}

fn normalize_truthy(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_domain::Difficulty;

    fn base_question(question_type: QuestionType) -> Question {
        Question {
            id: "q1".into(),
            question_type,
            subject: "Math".into(),
            grade: "Grade 3".into(),
            content: "content".into(),
            difficulty: Difficulty::Easy,
            points: 10,
            hints: vec![],
            career_context: "Chef".into(),
            skill_id: "g3-math-a1".into(),
            options: None,
            correct_answer: None,
            visual: None,
            tolerance: None,
        }
    }

    #[test]
    fn counting_answer_is_derived_from_visual_not_stored_index() {
        let registry = QuestionTypeRegistry::new();
        let mut q = base_question(QuestionType::Counting);
        q.visual = Some("🍎 🍎 🍎".into());
        q.correct_answer = Some("99".into()); // deliberately wrong/stale

        assert!(registry.validate_answer(&q, "3").unwrap());
        assert!(!registry.validate_answer(&q, "99").unwrap());
    }

    #[test]
    fn counting_without_visual_is_a_consistency_violation() {
        let registry = QuestionTypeRegistry::new();
        let q = base_question(QuestionType::Counting);
        assert!(registry.validate_answer(&q, "3").is_err());
    }

    #[test]
    fn multiple_choice_matches_index_or_text() {
        let registry = QuestionTypeRegistry::new();
        let mut q = base_question(QuestionType::MultipleChoice);
        q.options = Some(vec!["Cat".into(), "Dog".into(), "Fish".into()]);
        q.correct_answer = Some("Dog".into());

        assert!(registry.validate_answer(&q, "1").unwrap());
        assert!(registry.validate_answer(&q, " dog ").unwrap());
        assert!(!registry.validate_answer(&q, "Cat").unwrap());
    }

    #[test]
    fn numeric_respects_tolerance() {
        let registry = QuestionTypeRegistry::new();
        let mut q = base_question(QuestionType::Numeric);
        q.correct_answer = Some("10".into());
        q.tolerance = Some(0.5);

        assert!(registry.validate_answer(&q, "10.4").unwrap());
        assert!(!registry.validate_answer(&q, "10.6").unwrap());
    }

    #[test]
    fn true_false_accepts_yes_no_aliases() {
        let registry = QuestionTypeRegistry::new();
        let mut q = base_question(QuestionType::TrueFalse);
        q.correct_answer = Some("true".into());

        assert!(registry.validate_answer(&q, "yes").unwrap());
        assert!(registry.validate_answer(&q, "1").unwrap());
        assert!(!registry.validate_answer(&q, "no").unwrap());
    }

    #[test]
    fn ela_disallows_counting_questions() {
        let registry = QuestionTypeRegistry::new();
        assert!(!registry.is_allowed_for_subject(QuestionType::Counting, "ELA"));
        assert!(registry.is_allowed_for_subject(QuestionType::Counting, "Math"));
    }

    #[test]
    fn duplicate_questions_are_rejected() {
        let registry = QuestionTypeRegistry::new();
        let q1 = base_question(QuestionType::MultipleChoice);
        let mut q2 = base_question(QuestionType::MultipleChoice);
        q2.id = "q2".into();

        assert!(registry.validate_no_duplicates(&[q1, q2]).is_err());
    }
}
