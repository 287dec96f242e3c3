/// Normalizes the many ways a grade level shows up at the edges of the
/// system ("K", "0", "Kindergarten", "1", "Grade 1", ...) into the single
/// canonical string the rest of the platform keys reference data on.
pub fn normalize_grade(input: &str) -> String {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();

    match lower.as_str() {
        "k" | "0" | "kindergarten" => "Kindergarten".to_string(),
        _ => {
            if let Some(stripped) = lower.strip_prefix("grade ") {
                if let Ok(n) = stripped.trim().parse::<u32>() {
                    return format!("Grade {n}");
                }
            }
            if let Ok(n) = lower.parse::<u32>() {
                return format!("Grade {n}");
            }
            // Already canonical, or an unrecognized label we pass through
            // verbatim rather than reject — callers downstream treat an
            // unmapped grade as "no clusters available" rather than an error.
            trimmed.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_kindergarten_aliases() {
        assert_eq!(normalize_grade("K"), "Kindergarten");
        assert_eq!(normalize_grade("0"), "Kindergarten");
        assert_eq!(normalize_grade("Kindergarten"), "Kindergarten");
    }

    #[test]
    fn normalizes_numeric_grades() {
        assert_eq!(normalize_grade("1"), "Grade 1");
        assert_eq!(normalize_grade("10"), "Grade 10");
        assert_eq!(normalize_grade("grade 10"), "Grade 10");
        assert_eq!(normalize_grade("Grade 10"), "Grade 10");
    }
}
