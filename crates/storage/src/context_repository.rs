//! Postgres-backed `DailyContextRepository` (§4.D.1, §5, §6).
//!
//! `DailyLearningContext` creation is serialized per `(studentId, date)`,
//! first-writer-wins (§5). The process-local `DailyLearningContextManager`
//! cache already enforces that within one process; this repository backs
//! it with the same guarantee across processes via `ON CONFLICT DO
//! NOTHING` followed by a re-select of whichever row actually landed.

use adaptive_content::DailyContextRepository;
use adaptive_domain::{DailyLearningContext, DomainError};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
struct ContextRow {
    data: serde_json::Value,
}

/// Component D.1's persistence boundary.
#[derive(Clone)]
pub struct PgDailyContextRepository {
    pool: PgPool,
}

impl PgDailyContextRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DailyContextRepository for PgDailyContextRepository {
    async fn load(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyLearningContext>, DomainError> {
        let row = sqlx::query_as::<_, ContextRow>(
            "SELECT data FROM adaptive_daily_contexts WHERE student_id = $1 AND date = $2",
        )
        .bind(student_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| serde_json::from_value(r.data).map_err(|e| DomainError::Internal(e.into())))
            .transpose()
    }

    async fn save(&self, context: &DailyLearningContext) -> Result<(), DomainError> {
        let data = serde_json::to_value(context).map_err(|e| DomainError::Internal(e.into()))?;

        sqlx::query(
            r#"
            INSERT INTO adaptive_daily_contexts (student_id, date, data, created_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (student_id, date) DO NOTHING
            "#,
        )
        .bind(&context.student_id)
        .bind(context.date)
        .bind(&data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
