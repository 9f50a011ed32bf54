//! `PostgreSQL` implementation of the `EventStore` trait.

use async_trait::async_trait;
use leaderview_core::error::DomainError;
use leaderview_core::event::{Event, EventData, EventWithVersion, Operation};
use leaderview_core::repository::EventStore;
use sqlx::PgPool;
use tracing::debug;

use crate::schema::infrastructure;

#[derive(sqlx::FromRow)]
struct EventRow {
    version: i64,
    aggregate_root: String,
    operation_id: String,
    payload: serde_json::Value,
}

impl EventRow {
    fn into_event(self) -> Result<EventWithVersion, DomainError> {
        let event_data: EventData = serde_json::from_value(self.payload)?;
        Ok(EventWithVersion {
            version: self.version,
            event: Event {
                aggregate_root: self.aggregate_root,
                operation_id: self.operation_id,
                event_data,
            },
        })
    }
}

/// PostgreSQL-backed global event log.
///
/// Appends take an exclusive table lock and assign `MAX(version) + 1`, so a
/// reader can never observe a version gap left by an in-flight transaction.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn save(&self, event: Event) -> Result<Operation, DomainError> {
        let event_type = event.event_data.event_type();
        let payload = serde_json::to_value(&event.event_data)?;

        let mut tx = self.pool.begin().await.map_err(infrastructure)?;
        sqlx::query("LOCK TABLE events IN EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(infrastructure)?;

        let (version,) = sqlx::query_as::<_, (i64,)>(
            r"
            INSERT INTO events (version, aggregate_root, operation_id, event_type, payload)
            SELECT COALESCE(MAX(version), 0) + 1, $1, $2, $3, $4 FROM events
            RETURNING version
            ",
        )
        .bind(&event.aggregate_root)
        .bind(&event.operation_id)
        .bind(event_type)
        .bind(&payload)
        .fetch_one(&mut *tx)
        .await
        .map_err(infrastructure)?;

        tx.commit().await.map_err(infrastructure)?;
        debug!(version, event_type, aggregate_root = %event.aggregate_root, "event appended");

        Ok(Operation {
            id: event.operation_id,
            aggregate_root: event.aggregate_root,
            event_type: event_type.to_owned(),
            version,
        })
    }

    async fn get_events(
        &self,
        from_version_exclusive: i64,
    ) -> Result<Vec<EventWithVersion>, DomainError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r"
            SELECT version, aggregate_root, operation_id, payload
            FROM events
            WHERE version > $1
            ORDER BY version ASC
            ",
        )
        .bind(from_version_exclusive)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.into_iter().map(EventRow::into_event).collect()
    }
}
