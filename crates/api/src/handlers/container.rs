//! Container-lifecycle endpoints (§4.F Container Mediator): entry and
//! completion for one `(student, container)` pair. Delegates straight to
//! `ContainerMediator`; the only logic living here is request-shape
//! translation and volume-mode resolution (§6 "Volume / mode configuration").

use std::collections::HashMap;
use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use adaptive_content::SessionStateManager;
use adaptive_domain::{
    Container, ContainerPerformance, DomainError, MultiSubjectContent, SubjectPerformanceSnapshot,
    VolumeMode,
};
use adaptive_mediator::{ContainerCompleteRequest, ContainerEnterRequest};

use crate::AppState;
use crate::middleware::auth::AuthStudent;

/// Account flags read from the (external) billing/account service that
/// drive default volume-mode selection (§6 precedence table).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountFlags {
    #[serde(default)]
    pub is_demo: bool,
    #[serde(default)]
    pub is_test_account: bool,
    #[serde(default)]
    pub tier: Option<String>,
}

/// `admin override > user flag (isDemo -> demo, isTestAccount -> testing,
/// tier=premium -> full) > default standard` (§6).
pub fn resolve_volume_mode(admin_override: Option<VolumeMode>, flags: &AccountFlags) -> VolumeMode {
    if let Some(mode) = admin_override {
        return mode;
    }
    if flags.is_demo {
        return VolumeMode::Demo;
    }
    if flags.is_test_account {
        return VolumeMode::Testing;
    }
    if flags.tier.as_deref() == Some("premium") {
        return VolumeMode::Full;
    }
    VolumeMode::Standard
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContainerEnterBody {
    pub container: Container,
    #[validate(length(min = 1, message = "career must not be empty"))]
    pub career: String,
    #[validate(length(min = 1, message = "companion must not be empty"))]
    pub companion: String,
    #[validate(length(min = 1, message = "primary_skill must not be empty"))]
    pub primary_skill: String,
    /// Falls back to the grade carried in the auth claims when omitted.
    pub grade: Option<String>,
    #[serde(default)]
    pub account_flags: AccountFlags,
    /// Explicit admin override of the resolved volume mode.
    pub volume_mode_override: Option<VolumeMode>,
    #[serde(default)]
    pub performance: Option<HashMap<String, SubjectPerformanceSnapshot>>,
}

pub async fn container_enter(
    State(state): State<Arc<AppState>>,
    AuthStudent { student_id, grade_level }: AuthStudent,
    Json(body): Json<ContainerEnterBody>,
) -> Result<Json<MultiSubjectContent>, DomainError> {
    body.validate().map_err(DomainError::from_validation_errors)?;

    let grade = body
        .grade
        .or(grade_level)
        .ok_or_else(|| DomainError::Validation("grade is required".to_string()))?;

    let volume_mode = resolve_volume_mode(body.volume_mode_override, &body.account_flags);

    let content = state
        .mediator
        .container_enter(ContainerEnterRequest {
            user_id: student_id,
            grade,
            container: body.container,
            career: body.career,
            companion: body.companion,
            primary_skill: body.primary_skill,
            volume_mode,
            performance: body.performance,
        })
        .await?;

    Ok(Json(content))
}

#[derive(Debug, Deserialize)]
pub struct ContainerCompleteBody {
    pub container: Container,
    pub grade: Option<String>,
    pub performance: ContainerPerformance,
}

#[derive(Debug, Serialize)]
pub struct ContainerCompleteResponse {
    pub acknowledged: bool,
}

pub async fn container_complete(
    State(state): State<Arc<AppState>>,
    AuthStudent { student_id, grade_level }: AuthStudent,
    Json(body): Json<ContainerCompleteBody>,
) -> Result<Json<ContainerCompleteResponse>, DomainError> {
    let grade = body
        .grade
        .or(grade_level)
        .ok_or_else(|| DomainError::Validation("grade is required".to_string()))?;

    state
        .mediator
        .container_complete(ContainerCompleteRequest {
            user_id: student_id,
            grade,
            container: body.container,
            performance: body.performance,
        })
        .await?;

    Ok(Json(ContainerCompleteResponse { acknowledged: true }))
}

/// Exposed so operators can force a regeneration (§4.D.4 Caching: "explicit
/// `invalidate(userId)`") without waiting out the 30-minute in-memory TTL.
pub async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    AuthStudent { student_id, .. }: AuthStudent,
) -> Result<Json<ContainerCompleteResponse>, DomainError> {
    state.content.invalidate(&student_id);
    Ok(Json(ContainerCompleteResponse { acknowledged: true }))
}

/// Surfaces whether the caller can resume a session and which container
/// they're allowed to enter next (§4.D.7).
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub current_container: Option<Container>,
    pub can_enter_learn: bool,
    pub can_enter_experience: bool,
    pub can_enter_discover: bool,
}

pub async fn session_status(
    State(state): State<Arc<AppState>>,
    AuthStudent { student_id, .. }: AuthStudent,
) -> Json<SessionStatusResponse> {
    let session = sessions(&state).create_or_resume_session(&student_id);
    Json(SessionStatusResponse {
        session_id: session.session_id,
        current_container: session.current_container,
        can_enter_learn: session.can_enter(Container::Learn),
        can_enter_experience: session.can_enter(Container::Experience),
        can_enter_discover: session.can_enter(Container::Discover),
    })
}

fn sessions(state: &AppState) -> &Arc<SessionStateManager> {
    &state.sessions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_override_wins_over_every_flag() {
        let flags = AccountFlags {
            is_demo: true,
            is_test_account: true,
            tier: Some("premium".to_string()),
        };
        assert_eq!(
            resolve_volume_mode(Some(VolumeMode::Testing), &flags),
            VolumeMode::Testing
        );
    }

    #[test]
    fn demo_flag_beats_test_account_and_tier() {
        let flags = AccountFlags {
            is_demo: true,
            is_test_account: true,
            tier: Some("premium".to_string()),
        };
        assert_eq!(resolve_volume_mode(None, &flags), VolumeMode::Demo);
    }

    #[test]
    fn premium_tier_without_other_flags_resolves_full() {
        let flags = AccountFlags {
            tier: Some("premium".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_volume_mode(None, &flags), VolumeMode::Full);
    }

    #[test]
    fn no_flags_defaults_to_standard() {
        assert_eq!(resolve_volume_mode(None, &AccountFlags::default()), VolumeMode::Standard);
    }
}
