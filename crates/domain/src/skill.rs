//! Skill and skill-cluster reference data (§3 Skill / SkillCluster).

use serde::{Deserialize, Serialize};

/// A single skill within a grade/subject skill tree. Immutable reference
/// data — never mutated once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Skill {
    pub id: String,
    pub subject: String,
    pub grade: String,
    /// e.g. "A.1"
    pub skill_number: String,
    pub skill_name: String,
    pub description: String,
}

impl Skill {
    /// First character of `skill_number`, e.g. "A" for "A.1".
    pub fn cluster_prefix(&self) -> String {
        self.skill_number
            .chars()
            .next()
            .map(|c| c.to_string())
            .unwrap_or_default()
    }
}

/// An ordered sequence of skills sharing `(grade, subject, cluster_prefix)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCluster {
    pub grade: String,
    pub subject: String,
    pub cluster_prefix: String,
    /// Ordered by `skill_number`.
    pub skills: Vec<Skill>,
    pub is_diagnostic: bool,
}

impl SkillCluster {
    pub fn skill_ids(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.id.clone()).collect()
    }
}

/// Per-skill diagnostic result, keyed by skill id, used to seed an adaptive
/// path (§4.B `buildAdaptivePath`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub skill_id: String,
    pub correct: bool,
}
