//! Skill Cluster Service (component B): a read-only loader for grade/subject
//! skill trees, with grade normalization and grade-to-subject name mapping.

mod grade;
mod service;
mod subject_map;
mod tree;

pub use grade::normalize_grade;
pub use service::SkillClusterService;
pub use subject_map::map_subject_for_grade;

/// The base subjects every grade is evaluated against before grade-specific
/// remapping (§4.B). Used by callers that need "every offered subject" for
/// a grade, e.g. the Journey Engine's continuous-assignment sweep.
pub const BASE_SUBJECTS: [&str; 4] = ["Math", "ELA", "Science", "Social Studies"];
