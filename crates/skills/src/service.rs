use std::collections::HashSet;

use adaptive_domain::{DiagnosticResult, Skill, SkillCluster};

use crate::tree::SKILL_TREE;

/// The Skill Cluster Service: a read-only loader over the static skill tree,
/// grade normalization, and grade-to-subject remapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillClusterService;

impl SkillClusterService {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize_grade(&self, input: &str) -> String {
        crate::grade::normalize_grade(input)
    }

    pub fn map_subject_for_grade(&self, subject: &str, grade: &str) -> Option<String> {
        crate::subject_map::map_subject_for_grade(subject, grade)
    }

    /// Loads every skill sharing `(grade, subject, prefix)`, ordered by
    /// `skill_number`. `None` if the combination has no skills.
    pub fn load_cluster(&self, grade: &str, subject: &str, prefix: &str) -> Option<SkillCluster> {
        let mut skills: Vec<Skill> = SKILL_TREE
            .iter()
            .filter(|s| s.grade == grade && s.subject == subject && s.cluster_prefix() == prefix)
            .cloned()
            .collect();

        if skills.is_empty() {
            return None;
        }

        skills.sort_by(|a, b| a.skill_number.cmp(&b.skill_number));

        Some(SkillCluster {
            grade: grade.to_string(),
            subject: subject.to_string(),
            cluster_prefix: prefix.to_string(),
            skills,
            is_diagnostic: prefix == "A",
        })
    }

    pub fn get_diagnostic_cluster(&self, grade: &str, subject: &str) -> Option<SkillCluster> {
        self.load_cluster(grade, subject, "A")
    }

    pub fn get_skill_by_id(&self, id: &str) -> Option<Skill> {
        SKILL_TREE.iter().find(|s| s.id == id).cloned()
    }

    /// Reorders a subject's default skill ordering so that skills correlated
    /// with an incorrect diagnostic answer come first. Tie-breaks preserve
    /// the tree's original ordering (a stable sort over "incorrect first").
    pub fn build_adaptive_path(
        &self,
        grade: &str,
        subject: &str,
        diagnostic_results: &[DiagnosticResult],
    ) -> Vec<String> {
        let incorrect: HashSet<&str> = diagnostic_results
            .iter()
            .filter(|r| !r.correct)
            .map(|r| r.skill_id.as_str())
            .collect();

        let mut ordered: Vec<Skill> = SKILL_TREE
            .iter()
            .filter(|s| s.grade == grade && s.subject == subject && s.cluster_prefix() != "A")
            .cloned()
            .collect();
        ordered.sort_by(|a, b| a.skill_number.cmp(&b.skill_number));

        ordered.sort_by_key(|s| !incorrect.contains(s.id.as_str()));

        ordered.into_iter().map(|s| s.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_cluster_filters_and_sorts() {
        let svc = SkillClusterService::new();
        let cluster = svc.load_cluster("Grade 3", "Math", "B").unwrap();
        assert_eq!(cluster.skills.len(), 3);
        assert_eq!(cluster.skills[0].id, "g3-math-b1");
        assert!(!cluster.is_diagnostic);
    }

    #[test]
    fn diagnostic_cluster_is_prefix_a() {
        let svc = SkillClusterService::new();
        let cluster = svc.get_diagnostic_cluster("Grade 3", "Math").unwrap();
        assert!(cluster.is_diagnostic);
        assert_eq!(cluster.skills.len(), 2);
    }

    #[test]
    fn missing_combination_returns_none() {
        let svc = SkillClusterService::new();
        assert!(svc.load_cluster("Grade 12", "Underwater Basketweaving", "A").is_none());
    }

    #[test]
    fn adaptive_path_puts_missed_skills_first_and_preserves_order_on_ties() {
        let svc = SkillClusterService::new();
        let results = vec![
            DiagnosticResult { skill_id: "g3-math-b2".to_string(), correct: false },
            DiagnosticResult { skill_id: "g3-math-b1".to_string(), correct: true },
        ];
        let path = svc.build_adaptive_path("Grade 3", "Math", &results);

        assert_eq!(path[0], "g3-math-b2");
        // ties among the remaining (correct / unscored) skills keep tree order
        assert_eq!(path[1], "g3-math-b1");
        assert_eq!(path[2], "g3-math-b3");
    }
}
