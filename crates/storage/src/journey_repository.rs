//! Postgres-backed `JourneyRepository` (§4.C, §6).
//!
//! A `Journey` is a small, wholly-owned-by-one-student aggregate with no
//! cross-row relational structure worth normalizing -- exactly the shape
//! the teacher stores as a JSON blob elsewhere (`bingo_card`,
//! `unlocked_positions`, `bingo_winners`). One row per student, the whole
//! aggregate serialized into a `jsonb` column; `save` is a single
//! `INSERT ... ON CONFLICT DO UPDATE`.

use adaptive_domain::{DomainError, Journey};
use adaptive_journey::JourneyRepository;
use async_trait::async_trait;
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
struct JourneyRow {
    data: serde_json::Value,
}

/// Component C's persistence boundary, backed by a single `jsonb` column.
#[derive(Clone)]
pub struct PgJourneyRepository {
    pool: PgPool,
}

impl PgJourneyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JourneyRepository for PgJourneyRepository {
    async fn load(&self, student_id: &str) -> Result<Option<Journey>, DomainError> {
        let row = sqlx::query_as::<_, JourneyRow>(
            "SELECT data FROM adaptive_journeys WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::JourneyPersistenceError(e.to_string()))?;

        row.map(|r| serde_json::from_value(r.data).map_err(|e| DomainError::JourneyPersistenceError(e.to_string())))
            .transpose()
    }

    async fn save(&self, journey: &Journey) -> Result<(), DomainError> {
        let data = serde_json::to_value(journey)
            .map_err(|e| DomainError::JourneyPersistenceError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO adaptive_journeys (student_id, grade_level, data, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (student_id) DO UPDATE SET
                grade_level = EXCLUDED.grade_level,
                data = EXCLUDED.data,
                updated_at = now()
            "#,
        )
        .bind(&journey.student_id)
        .bind(&journey.grade_level)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::JourneyPersistenceError(e.to_string()))?;

        Ok(())
    }
}
