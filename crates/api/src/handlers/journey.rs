//! Adaptive Journey Engine endpoints (component C, §4.C).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use adaptive_domain::{Assignment, DomainError, Skill};

use crate::AppState;
use crate::middleware::auth::AuthStudent;

#[derive(Debug, Deserialize)]
pub struct SubjectQuery {
    pub subject: String,
    pub grade: Option<String>,
}

/// `getCurrentSkillForSubject` (§4.C): an idempotent query, never advances
/// the pointer. Returns `null` cleanly when the subject isn't offered at
/// the student's grade (e.g. Grade 10 ELA) — never a 4xx/5xx.
pub async fn current_skill(
    State(state): State<Arc<AppState>>,
    AuthStudent { student_id, grade_level }: AuthStudent,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<Option<Skill>>, DomainError> {
    let grade = query
        .grade
        .or(grade_level)
        .ok_or_else(|| DomainError::Validation("grade is required".to_string()))?;

    let skill = state
        .journey
        .get_current_skill_for_subject(&student_id, &query.subject, &grade)
        .await;

    Ok(Json(skill))
}

#[derive(Debug, Deserialize)]
pub struct GradeQuery {
    pub grade: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentsResponse {
    pub assignments: Vec<Assignment>,
}

/// `getContinuousAssignments` (§4.C): one active assignment per subject
/// actually offered at this grade.
pub async fn continuous_assignments(
    State(state): State<Arc<AppState>>,
    AuthStudent { student_id, grade_level }: AuthStudent,
    Query(query): Query<GradeQuery>,
) -> Result<Json<AssignmentsResponse>, DomainError> {
    let grade = query
        .grade
        .or(grade_level)
        .ok_or_else(|| DomainError::Validation("grade is required".to_string()))?;

    let assignments = state.journey.get_continuous_assignments(&student_id, &grade).await;
    Ok(Json(AssignmentsResponse { assignments }))
}
