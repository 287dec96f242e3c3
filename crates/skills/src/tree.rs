//! Static grade/subject skill-tree reference data. Read-only: the service
//! layer never mutates this, it only filters and reorders views over it.

use adaptive_domain::Skill;
use once_cell::sync::Lazy;

fn skill(id: &str, subject: &str, grade: &str, number: &str, name: &str, description: &str) -> Skill {
    Skill {
        id: id.to_string(),
        subject: subject.to_string(),
        grade: grade.to_string(),
        skill_number: number.to_string(),
        skill_name: name.to_string(),
        description: description.to_string(),
    }
}

/// The full reference tree, ordered by `(grade, subject, skill_number)`. The
/// "A" cluster prefix is reserved for the diagnostic cluster in every
/// grade/subject pair, per §4.C's `clusterPrefix == 'A'` diagnostic rule.
pub static SKILL_TREE: Lazy<Vec<Skill>> = Lazy::new(|| {
    vec![
        skill("g3-math-a1", "Math", "Grade 3", "A.1", "Place Value", "Understand place value to the thousands."),
        skill("g3-math-a2", "Math", "Grade 3", "A.2", "Rounding", "Round multi-digit numbers to a given place."),
        skill("g3-math-b1", "Math", "Grade 3", "B.1", "Addition Fluency", "Add multi-digit numbers fluently."),
        skill("g3-math-b2", "Math", "Grade 3", "B.2", "Subtraction Fluency", "Subtract multi-digit numbers fluently."),
        skill("g3-math-b3", "Math", "Grade 3", "B.3", "Word Problems", "Solve addition/subtraction word problems."),
        skill("g3-math-c1", "Math", "Grade 3", "C.1", "Multiplication Facts", "Recall multiplication facts to 10x10."),

        skill("g5-math-a1", "Math", "Grade 5", "A.1", "Fraction Sense", "Compare and order fractions."),
        skill("g5-math-a2", "Math", "Grade 5", "A.2", "Decimal Sense", "Compare and order decimals."),
        skill("g5-math-b1", "Math", "Grade 5", "B.1", "Fraction Addition", "Add fractions with unlike denominators."),
        skill("g5-math-b2", "Math", "Grade 5", "B.2", "Fraction Multiplication", "Multiply fractions and mixed numbers."),

        skill("g10-algebra1-a1", "Algebra I", "Grade 10", "A.1", "Linear Equations", "Solve one-variable linear equations."),
        skill("g10-algebra1-a2", "Algebra I", "Grade 10", "A.2", "Linear Inequalities", "Solve and graph linear inequalities."),
        skill("g10-algebra1-b1", "Algebra I", "Grade 10", "B.1", "Systems of Equations", "Solve systems by substitution and elimination."),
        skill("g10-algebra1-b2", "Algebra I", "Grade 10", "B.2", "Quadratic Factoring", "Factor quadratic expressions."),

        skill("g10-precalc-a1", "Pre-Calculus", "Grade 10", "A.1", "Function Notation", "Evaluate and compose functions."),
        skill("g10-precalc-b1", "Pre-Calculus", "Grade 10", "B.1", "Trigonometric Ratios", "Apply sine, cosine, and tangent ratios."),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_grade_subject_has_a_diagnostic_cluster() {
        let has_a_cluster = SKILL_TREE
            .iter()
            .any(|s| s.grade == "Grade 5" && s.subject == "Math" && s.cluster_prefix() == "A");
        assert!(has_a_cluster);
    }
}
