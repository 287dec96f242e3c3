use adaptive_domain::SubjectContent;

/// Outcome of a single validation pass. `corrected` is advisory: the caller
/// substitutes it and records a `consistency_repair` event rather than
/// treating the validator as authoritative.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub violations: Vec<String>,
    pub corrected: Option<String>,
}

impl ValidationOutcome {
    fn ok() -> Self {
        Self {
            valid: true,
            violations: Vec::new(),
            corrected: None,
        }
    }
}

/// Scans generated content for drift from the day's career/skill context.
/// Conservative by design — it flags likely mismatches, it does not attempt
/// to fully parse or understand generated text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyValidator;

impl ConsistencyValidator {
    pub fn new() -> Self {
        Self
    }

    /// Flags content that mentions a different career than the one assigned
    /// for the day.
    pub fn validate_career_context(&self, content: &str, career: &str) -> ValidationOutcome {
        const KNOWN_CAREERS: &[&str] = &[
            "Chef", "Vet", "Astronaut", "Doctor", "Engineer", "Teacher", "Artist", "Firefighter",
            "Pilot", "Scientist",
        ];

        let lower = content.to_lowercase();
        let mentions_assigned = lower.contains(&career.to_lowercase());
        let mentions_other: Vec<&str> = KNOWN_CAREERS
            .iter()
            .filter(|&&other| other != career && lower.contains(&other.to_lowercase()))
            .copied()
            .collect();

        if mentions_other.is_empty() {
            return ValidationOutcome::ok();
        }

        let violations = mentions_other
            .iter()
            .map(|other| format!("mentions off-context career \"{other}\" instead of \"{career}\""))
            .collect();

        let corrected = if mentions_assigned {
            None
        } else {
            Some(content.replacen(mentions_other[0], career, 1))
        };

        ValidationOutcome {
            valid: false,
            violations,
            corrected,
        }
    }

    /// Flags content that never references the primary skill at all, beyond
    /// a trivial substring check — a real implementation would use semantic
    /// matching, but the validator only needs to catch gross drift.
    pub fn validate_skill_focus(&self, content: &str, primary_skill: &str) -> ValidationOutcome {
        let keywords: Vec<&str> = primary_skill
            .split_whitespace()
            .filter(|w| w.len() > 3)
            .collect();

        if keywords.is_empty() {
            return ValidationOutcome::ok();
        }

        let lower = content.to_lowercase();
        let hits = keywords
            .iter()
            .filter(|kw| lower.contains(&kw.to_lowercase()))
            .count();

        if hits == 0 {
            ValidationOutcome {
                valid: false,
                violations: vec![format!("content does not reference skill \"{primary_skill}\"")],
                corrected: None,
            }
        } else {
            ValidationOutcome::ok()
        }
    }

    /// Checks that every subject's content was generated under the same
    /// primary skill / career, which should always be true by construction
    /// but is validated to catch an upstream bug rather than propagate it
    /// silently.
    pub fn validate_cross_subject_coherence(&self, contents: &[SubjectContent]) -> ValidationOutcome {
        let distinct_adapted_skills: std::collections::HashSet<&str> =
            contents.iter().map(|c| c.adapted_skill.as_str()).collect();

        // Different subjects legitimately have different adapted-skill text
        // (that's the point of adaptation); coherence here means every
        // subject produced *some* non-empty adapted skill, not that they
        // match verbatim.
        let empty = contents.iter().any(|c| c.adapted_skill.trim().is_empty());
        let _ = distinct_adapted_skills;

        if empty {
            ValidationOutcome {
                valid: false,
                violations: vec!["one or more subjects has an empty adapted skill".to_string()],
                corrected: None,
            }
        } else {
            ValidationOutcome::ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_off_context_career_mentions() {
        let validator = ConsistencyValidator::new();
        let outcome =
            validator.validate_career_context("The astronaut counts 3 stars.", "Chef");
        assert!(!outcome.valid);
        assert!(outcome.corrected.is_some());
    }

    #[test]
    fn passes_content_matching_the_assigned_career() {
        let validator = ConsistencyValidator::new();
        let outcome = validator.validate_career_context("The chef counts 3 apples.", "Chef");
        assert!(outcome.valid);
    }

    #[test]
    fn flags_content_missing_the_primary_skill() {
        let validator = ConsistencyValidator::new();
        let outcome = validator.validate_skill_focus("What color is the sky?", "Identify numbers up to 3");
        assert!(!outcome.valid);
    }
}
