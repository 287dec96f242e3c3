//! Question and generated-content types (§3 Question, §4.D).

use serde::{Deserialize, Serialize};

use crate::context::Container;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hint {
    pub text: String,
    pub order: u32,
}

/// Discriminated question types (§3 Question, §4.D.6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    Numeric,
    FillBlank,
    Counting,
    Matching,
    Ordering,
    ShortAnswer,
}

/// A single generated question. Type-specific fields are folded into
/// `Option`s rather than a further nested enum so the wire format stays a
/// flat JSON object, matching what the JIT generator actually emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub subject: String,
    pub grade: String,
    pub content: String,
    pub difficulty: Difficulty,
    pub points: u32,
    pub hints: Vec<Hint>,
    pub career_context: String,
    pub skill_id: String,

    /// multipleChoice / trueFalse / numeric / counting
    pub options: Option<Vec<String>>,
    /// Index into `options`, or the literal correct text/number as a string.
    pub correct_answer: Option<String>,
    /// counting: emoji/image tokens whose count is the correct answer. Must
    /// be non-empty for `QuestionType::Counting`.
    pub visual: Option<String>,
    /// numeric: accepted absolute deviation from the correct value.
    pub tolerance: Option<f64>,
}

impl Question {
    /// Fingerprint used to reject duplicate questions within a content
    /// block (§4.D.6 structural rule).
    pub fn fingerprint(&self) -> String {
        let normalized_content = self.content.trim().to_lowercase();
        format!(
            "{}|{:?}|{}",
            normalized_content, self.question_type, self.subject
        )
    }

    /// Number of visual tokens, used for counting-type correctness instead
    /// of any stored index.
    pub fn visual_count(&self) -> Option<usize> {
        self.visual.as_ref().map(|v| {
            v.split_whitespace()
                .filter(|tok| !tok.is_empty())
                .count()
        })
    }
}

/// One subject's worth of generated content for a container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectContent {
    pub subject: String,
    pub adapted_skill: String,
    pub questions: Vec<Question>,
}

/// Output of `generateContainerContent` — one set of questions per subject
/// of the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiSubjectContent {
    pub user_id: String,
    pub container: Container,
    pub career: String,
    pub primary_skill: String,
    pub subjects: Vec<SubjectContent>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Named volume profile selecting question counts and session depth (§4.D.4).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VolumeMode {
    Demo,
    Testing,
    Standard,
    Full,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub mode: VolumeMode,
    pub practice_count: u32,
    pub assessment_count: u32,
    pub target_minutes: u32,
}

impl VolumeProfile {
    pub fn for_mode(mode: VolumeMode) -> Self {
        match mode {
            VolumeMode::Demo => Self {
                mode,
                practice_count: 2,
                assessment_count: 1,
                target_minutes: 2,
            },
            VolumeMode::Testing => Self {
                mode,
                practice_count: 4,
                assessment_count: 1,
                target_minutes: 5,
            },
            VolumeMode::Standard => Self {
                mode,
                practice_count: 8,
                assessment_count: 3,
                target_minutes: 15,
            },
            VolumeMode::Full | VolumeMode::Custom => Self {
                mode,
                practice_count: 15,
                assessment_count: 5,
                target_minutes: 20,
            },
        }
    }

    pub fn total_questions(&self) -> u32 {
        self.practice_count + self.assessment_count
    }
}

/// Per-subject, pre-performance-adaptation scaffolding level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Scaffolding {
    None,
    Standard,
    Extra,
}

/// Prior performance for a subject, used to skew difficulty distribution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubjectPerformanceSnapshot {
    pub subject_accuracy: f64,
}

impl SubjectPerformanceSnapshot {
    pub fn scaffolding(&self) -> Scaffolding {
        if self.subject_accuracy < 0.6 {
            Scaffolding::Extra
        } else {
            Scaffolding::Standard
        }
    }

    pub fn advanced_unlocked(&self) -> bool {
        self.subject_accuracy >= 0.85
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_question_counts_visual_tokens() {
        let q = Question {
            id: "q1".into(),
            question_type: QuestionType::Counting,
            subject: "Math".into(),
            grade: "Kindergarten".into(),
            content: "How many balls?".into(),
            difficulty: Difficulty::Easy,
            points: 10,
            hints: vec![],
            career_context: "Chef".into(),
            skill_id: "A.1".into(),
            options: Some(vec!["2".into(), "3".into(), "4".into(), "5".into()]),
            correct_answer: Some("1".into()),
            visual: Some("\u{1F3BE} \u{1F3BE} \u{1F3BE}".into()),
            tolerance: None,
        };
        assert_eq!(q.visual_count(), Some(3));
    }

    #[test]
    fn volume_profiles_match_spec_table() {
        assert_eq!(VolumeProfile::for_mode(VolumeMode::Demo).total_questions(), 3);
        assert_eq!(VolumeProfile::for_mode(VolumeMode::Testing).total_questions(), 5);
        assert_eq!(VolumeProfile::for_mode(VolumeMode::Standard).total_questions(), 11);
        assert_eq!(VolumeProfile::for_mode(VolumeMode::Full).total_questions(), 20);
    }

    #[test]
    fn scaffolding_thresholds() {
        assert_eq!(
            SubjectPerformanceSnapshot { subject_accuracy: 0.4 }.scaffolding(),
            Scaffolding::Extra
        );
        assert_eq!(
            SubjectPerformanceSnapshot { subject_accuracy: 0.7 }.scaffolding(),
            Scaffolding::Standard
        );
        assert!(SubjectPerformanceSnapshot { subject_accuracy: 0.9 }.advanced_unlocked());
        assert!(!SubjectPerformanceSnapshot { subject_accuracy: 0.5 }.advanced_unlocked());
    }
}
