//! Read-only skill cluster lookups (component B, §4.B). Mostly useful to
//! admin tooling and the mobile client's offline skill-tree cache; the
//! journey engine itself talks to `SkillClusterService` directly.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use adaptive_domain::{DomainError, Skill, SkillCluster};

use crate::AppState;

pub async fn get_skill(
    State(state): State<Arc<AppState>>,
    Path(skill_id): Path<String>,
) -> Result<Json<Skill>, DomainError> {
    state
        .skills
        .get_skill_by_id(&skill_id)
        .map(Json)
        .ok_or_else(|| DomainError::NotFound(format!("skill {skill_id}")))
}

#[derive(Debug, Deserialize)]
pub struct DiagnosticQuery {
    pub grade: String,
    pub subject: String,
}

pub async fn diagnostic_cluster(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiagnosticQuery>,
) -> Result<Json<SkillCluster>, DomainError> {
    let grade = state.skills.normalize_grade(&query.grade);
    state
        .skills
        .get_diagnostic_cluster(&grade, &query.subject)
        .map(Json)
        .ok_or_else(|| {
            DomainError::NotFound(format!(
                "no diagnostic cluster for grade {} subject {}",
                query.grade, query.subject
            ))
        })
}
