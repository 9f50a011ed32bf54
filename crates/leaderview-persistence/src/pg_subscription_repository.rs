//! `PostgreSQL` implementation of the `SubscriptionStateRepository` trait.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leaderview_core::error::DomainError;
use leaderview_core::repository::SubscriptionStateRepository;
use leaderview_core::subscription::{SubscriptionState, SubscriptionStatus};
use sqlx::PgPool;

use crate::schema::infrastructure;

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    status: String,
    version: i64,
    time: DateTime<Utc>,
    last_error: Option<String>,
}

/// PostgreSQL-backed subscription checkpoints.
#[derive(Debug, Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Creates a new `PgSubscriptionRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStateRepository for PgSubscriptionRepository {
    async fn get(&self, name: &str) -> Result<Option<SubscriptionState>, DomainError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            "SELECT status, version, time, last_error FROM subscriptions WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;

        row.map(|row| {
            Ok(SubscriptionState {
                status: SubscriptionStatus::from_str(&row.status)
                    .map_err(DomainError::Infrastructure)?,
                version: row.version,
                time: row.time,
                last_error: row.last_error,
            })
        })
        .transpose()
    }

    async fn save(&self, name: &str, state: &SubscriptionState) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO subscriptions (name, status, version, time, last_error)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE
            SET status = EXCLUDED.status,
                version = EXCLUDED.version,
                time = EXCLUDED.time,
                last_error = EXCLUDED.last_error
            ",
        )
        .bind(name)
        .bind(state.status.as_str())
        .bind(state.version)
        .bind(state.time)
        .bind(&state.last_error)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(())
    }
}
