use adaptive_domain::{DomainError, Journey};
use async_trait::async_trait;

/// Persistence boundary for journeys. Implemented against Postgres in the
/// storage crate; the engine never talks to a database directly so it can
/// retain an in-memory mutation and retry when this fails (§4.C failure
/// modes: "the engine retains the in-memory mutation and retries on the
/// next operation").
#[async_trait]
pub trait JourneyRepository: Send + Sync {
    async fn load(&self, student_id: &str) -> Result<Option<Journey>, DomainError>;
    async fn save(&self, journey: &Journey) -> Result<(), DomainError>;
}
