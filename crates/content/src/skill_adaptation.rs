/// Projects a primary skill onto a subject-specific restatement, preserving
/// the underlying cognitive operation (§4.D.2). Deterministic given inputs —
/// no randomness, no I/O — so it never needs to be async.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillAdaptationService;

impl SkillAdaptationService {
    pub fn new() -> Self {
        Self
    }

    pub fn adapt_skill_to_subject(&self, primary_skill: &str, subject: &str) -> String {
        let lower = primary_skill.to_lowercase();

        match subject {
            "ELA" => {
                if lower.contains("identify numbers") || lower.contains("count") {
                    "Find letters and count them".to_string()
                } else if lower.contains("compare") {
                    "Compare words by length".to_string()
                } else {
                    format!("Apply \"{primary_skill}\" to letters and words")
                }
            }
            "Science" => format!("Apply \"{primary_skill}\" to observations and measurements"),
            "Social Studies" => format!("Apply \"{primary_skill}\" to maps, people, and events"),
            // Math / Algebra I / Pre-Calculus / anything else: the primary
            // skill is usually already numeric, so pass it through.
            _ => primary_skill.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapts_counting_skill_to_ela() {
        let svc = SkillAdaptationService::new();
        let adapted = svc.adapt_skill_to_subject("Identify numbers up to 3", "ELA");
        assert_eq!(adapted, "Find letters and count them");
    }

    #[test]
    fn is_deterministic() {
        let svc = SkillAdaptationService::new();
        let a = svc.adapt_skill_to_subject("Identify numbers up to 3", "Science");
        let b = svc.adapt_skill_to_subject("Identify numbers up to 3", "Science");
        assert_eq!(a, b);
    }

    #[test]
    fn math_passes_through_unchanged() {
        let svc = SkillAdaptationService::new();
        assert_eq!(
            svc.adapt_skill_to_subject("Identify numbers up to 3", "Math"),
            "Identify numbers up to 3"
        );
    }
}
