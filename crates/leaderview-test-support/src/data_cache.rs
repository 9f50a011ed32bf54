//! In-memory data cache repository.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use leaderview_core::entity::{DataCache, Game};
use leaderview_core::error::DomainError;
use leaderview_core::repository::DataCacheRepository;

/// Snapshots held in memory, in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryDataCacheRepository {
    records: Mutex<Vec<DataCache>>,
}

impl InMemoryDataCacheRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository already holding `records`.
    #[must_use]
    pub fn with_records(records: Vec<DataCache>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Returns a snapshot of every stored record.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn records(&self) -> Vec<DataCache> {
        self.records.lock().unwrap().clone()
    }

    /// Removes every record.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }
}

#[async_trait]
impl DataCacheRepository for InMemoryDataCacheRepository {
    async fn insert(&self, records: &[DataCache]) -> Result<bool, DomainError> {
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(!records.is_empty())
    }

    async fn get(&self, entity_id: i64) -> Result<Vec<DataCache>, DomainError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn delete_expired_records(
        &self,
        ttl: Duration,
        game: Option<Game>,
        keep_last: bool,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let cutoff = now - ttl;
        let mut records = self.records.lock().unwrap();

        let mut newest: HashMap<i64, DateTime<Utc>> = HashMap::new();
        for record in records.iter() {
            let entry = newest.entry(record.entity_id).or_insert(record.inserted);
            if record.inserted > *entry {
                *entry = record.inserted;
            }
        }

        let before = records.len();
        records.retain(|r| {
            let in_scope = game.is_none_or(|g| g == r.game);
            let expired = r.inserted < cutoff;
            let protected = keep_last && newest.get(&r.entity_id) == Some(&r.inserted);
            !(in_scope && expired && !protected)
        });
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(entity_id: i64, hours_ago: i64, game: Game) -> DataCache {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        DataCache {
            entity_id,
            data: "{}".to_owned(),
            inserted: now - Duration::hours(hours_ago),
            game,
        }
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_newest_record_per_entity() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let repo = InMemoryDataCacheRepository::with_records(vec![
            record(1, 48, Game::Lol),
            record(1, 30, Game::Lol),
            record(2, 1, Game::Lol),
            record(3, 50, Game::Wow),
        ]);

        // Act
        let deleted = repo
            .delete_expired_records(Duration::hours(24), Some(Game::Lol), true, now)
            .await
            .unwrap();

        // Assert
        assert_eq!(deleted, 1);
        let remaining = repo.records();
        assert_eq!(remaining.len(), 3);
        assert!(remaining.iter().any(|r| r.entity_id == 3), "other games untouched");
    }
}
