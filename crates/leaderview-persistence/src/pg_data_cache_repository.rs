//! `PostgreSQL` implementation of the `DataCacheRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use leaderview_core::entity::{DataCache, Game};
use leaderview_core::error::DomainError;
use leaderview_core::repository::DataCacheRepository;
use sqlx::PgPool;
use tracing::info;

use crate::schema::{infrastructure, parse_game};

#[derive(sqlx::FromRow)]
struct DataCacheRow {
    entity_id: i64,
    data: String,
    inserted: DateTime<Utc>,
    game: String,
}

/// PostgreSQL-backed snapshot time series.
#[derive(Debug, Clone)]
pub struct PgDataCacheRepository {
    pool: PgPool,
}

impl PgDataCacheRepository {
    /// Creates a new `PgDataCacheRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataCacheRepository for PgDataCacheRepository {
    async fn insert(&self, records: &[DataCache]) -> Result<bool, DomainError> {
        if records.is_empty() {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await.map_err(infrastructure)?;
        for record in records {
            sqlx::query(
                "INSERT INTO data_cache (entity_id, data, inserted, game) VALUES ($1, $2, $3, $4)",
            )
            .bind(record.entity_id)
            .bind(&record.data)
            .bind(record.inserted)
            .bind(record.game.as_str())
            .execute(&mut *tx)
            .await
            .map_err(infrastructure)?;
        }
        tx.commit().await.map_err(infrastructure)?;
        Ok(true)
    }

    async fn get(&self, entity_id: i64) -> Result<Vec<DataCache>, DomainError> {
        let rows = sqlx::query_as::<_, DataCacheRow>(
            r"
            SELECT entity_id, data, inserted, game
            FROM data_cache
            WHERE entity_id = $1
            ORDER BY inserted ASC, id ASC
            ",
        )
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.into_iter()
            .map(|row| {
                Ok(DataCache {
                    entity_id: row.entity_id,
                    data: row.data,
                    inserted: row.inserted,
                    game: parse_game(&row.game)?,
                })
            })
            .collect()
    }

    async fn delete_expired_records(
        &self,
        ttl: Duration,
        game: Option<Game>,
        keep_last: bool,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let cutoff = now - ttl;
        let result = sqlx::query(
            r"
            DELETE FROM data_cache d
            WHERE d.inserted < $1
              AND ($2::VARCHAR IS NULL OR d.game = $2)
              AND (
                  NOT $3
                  OR d.inserted < (
                      SELECT MAX(l.inserted) FROM data_cache l WHERE l.entity_id = d.entity_id
                  )
              )
            ",
        )
        .bind(cutoff)
        .bind(game.map(Game::as_str))
        .bind(keep_last)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;

        let deleted = result.rows_affected();
        info!(deleted, game = ?game, keep_last, "expired data cache records deleted");
        Ok(deleted)
    }
}
