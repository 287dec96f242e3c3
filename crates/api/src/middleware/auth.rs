//! Bearer-token verification for the external authentication service (§1
//! "out of scope collaborators" — the core only ever reads claims the auth
//! service already issued, it never issues tokens itself).

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use jsonwebtoken::{DecodingKey, Validation, decode};

use adaptive_domain::{Claims, DomainError};

use crate::AppState;

/// Extracts and verifies the bearer JWT, returning the student id (`sub`)
/// and optional grade level carried in the claims.
pub fn auth_middleware(headers: &HeaderMap, jwt_secret: &str) -> Result<Claims, StatusCode> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    Ok(token_data.claims)
}

/// Axum extractor providing the authenticated student id (`sub` claim) and,
/// when present, the grade level the auth service carried alongside it.
pub struct AuthStudent {
    pub student_id: String,
    pub grade_level: Option<String>,
}

impl FromRequestParts<Arc<AppState>> for AuthStudent {
    type Rejection = DomainError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = auth_middleware(&parts.headers, &state.config.jwt_secret)
            .map_err(|_| DomainError::Unauthorized("invalid or missing token".to_string()))?;
        Ok(AuthStudent {
            student_id: claims.sub,
            grade_level: claims.grade_level,
        })
    }
}

/// Extractor enforcing the shared admin key for the admin-knobs / scheduler
/// manual-op endpoints (§6 "Admin knobs").
pub struct AdminApiKey;

impl FromRequestParts<Arc<AppState>> for AdminApiKey {
    type Rejection = DomainError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.config.admin_api_key.as_str();
        if expected.is_empty() {
            return Err(DomainError::Forbidden(
                "admin endpoints are disabled".to_string(),
            ));
        }

        let provided = parts
            .headers
            .get("x-admin-key")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| DomainError::Unauthorized("missing admin key".to_string()))?;

        if provided != expected {
            return Err(DomainError::Forbidden("invalid admin key".to_string()));
        }

        Ok(Self)
    }
}
