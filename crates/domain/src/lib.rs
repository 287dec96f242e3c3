//! Domain types for the adaptive learning orchestration core.

pub mod content;
pub mod context;
pub mod errors;
pub mod events;
pub mod game;
pub mod journey;
pub mod skill;

pub use content::*;
pub use context::*;
pub use errors::*;
pub use events::*;
pub use game::*;
pub use journey::*;
pub use skill::*;

/// A student accessing the platform. Auth/identity itself is an external
/// collaborator (§1 out of scope); this is the minimal identity the core
/// needs once a caller has been authenticated.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Student {
    pub id: String,
    pub grade_level: String,
}

/// Health check response.
#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub build_sha: String,
    pub uptime_seconds: u64,
}

/// Ready check response.
#[derive(Debug, serde::Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub database: String,
}

/// JWT claims issued by the external authentication service (§1 out of
/// scope collaborator). The core only ever verifies and reads these; it
/// never issues tokens itself.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String,
    pub grade_level: Option<String>,
    pub exp: usize,
}
