//! Bounded fan-out used by synchronizers.
//!
//! Fetch workers run with bounded concurrency and push into two bounded
//! queues: snapshots are drained by a single persisting task, errors by a
//! collecting task. The call returns once all three have finished.

use std::future::Future;

use futures::StreamExt;
use futures::stream;
use tokio::sync::mpsc;
use tracing::warn;

use crate::entity::{DataCache, Entity};
use crate::error::ServiceError;
use crate::repository::DataCacheRepository;

/// Fetches a snapshot for every entity with at most `concurrency` fetches in
/// flight, appends each snapshot to `cache`, and returns one error per entity
/// whose fetch or append failed.
pub async fn synchronize_concurrently<'a, F, Fut>(
    entities: &'a [Entity],
    concurrency: usize,
    cache: &dyn DataCacheRepository,
    fetch: F,
) -> Vec<ServiceError>
where
    F: Fn(&'a Entity) -> Fut,
    Fut: Future<Output = Result<DataCache, ServiceError>>,
{
    let capacity = concurrency.max(1);
    let (data_tx, mut data_rx) = mpsc::channel::<DataCache>(capacity);
    let (error_tx, mut error_rx) = mpsc::channel::<ServiceError>(capacity);

    let producer = {
        let error_tx = error_tx.clone();
        async move {
            stream::iter(entities)
                .for_each_concurrent(capacity, |entity| {
                    let data_tx = data_tx.clone();
                    let error_tx = error_tx.clone();
                    let fetched = fetch(entity);
                    async move {
                        match fetched.await {
                            Ok(record) => {
                                let _ = data_tx.send(record).await;
                            }
                            Err(err) => {
                                warn!(entity_id = entity.id(), error = %err, "entity synchronization failed");
                                let _ = error_tx.send(err).await;
                            }
                        }
                    }
                })
                .await;
        }
    };

    let persister = async move {
        while let Some(record) = data_rx.recv().await {
            let entity_id = record.entity_id;
            if let Err(err) = cache.insert(std::slice::from_ref(&record)).await {
                warn!(entity_id, error = %err, "failed to append data cache record");
                let _ = error_tx
                    .send(ServiceError::Storage(format!(
                        "entity {entity_id}: {err}"
                    )))
                    .await;
            }
        }
    };

    let collector = async move {
        let mut errors = Vec::new();
        while let Some(err) = error_rx.recv().await {
            errors.push(err);
        }
        errors
    };

    let ((), (), errors) = tokio::join!(producer, persister, collector);
    errors
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    use super::*;
    use crate::entity::{Game, WowEntity};
    use crate::error::DomainError;

    #[derive(Default)]
    struct VecCache {
        records: Mutex<Vec<DataCache>>,
        fail_for: Option<i64>,
    }

    #[async_trait]
    impl DataCacheRepository for VecCache {
        async fn insert(&self, records: &[DataCache]) -> Result<bool, DomainError> {
            if records.iter().any(|r| Some(r.entity_id) == self.fail_for) {
                return Err(DomainError::Infrastructure("disk full".into()));
            }
            self.records.lock().unwrap().extend_from_slice(records);
            Ok(true)
        }

        async fn get(&self, _entity_id: i64) -> Result<Vec<DataCache>, DomainError> {
            Ok(Vec::new())
        }

        async fn delete_expired_records(
            &self,
            _ttl: Duration,
            _game: Option<Game>,
            _keep_last: bool,
            _now: DateTime<Utc>,
        ) -> Result<u64, DomainError> {
            Ok(0)
        }
    }

    fn entity(id: i64) -> Entity {
        Entity::Wow(WowEntity {
            id,
            name: format!("char{id}"),
            region: "eu".to_owned(),
            realm: "draenor".to_owned(),
            blizzard_id: None,
        })
    }

    fn record(entity: &Entity) -> DataCache {
        DataCache {
            entity_id: entity.id(),
            data: "{}".to_owned(),
            inserted: Utc::now(),
            game: Game::Wow,
        }
    }

    #[tokio::test]
    async fn test_every_success_is_persisted_and_every_failure_reported() {
        // Arrange
        let entities: Vec<Entity> = (1..=10).map(entity).collect();
        let cache = VecCache::default();

        // Act
        let errors = synchronize_concurrently(&entities, 3, &cache, |e| async move {
            if e.id() % 2 == 0 {
                Err(ServiceError::NotFound(e.name().to_owned()))
            } else {
                Ok(record(e))
            }
        })
        .await;

        // Assert
        assert_eq!(errors.len(), 5);
        let mut persisted: Vec<i64> = cache
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.entity_id)
            .collect();
        persisted.sort_unstable();
        assert_eq!(persisted, vec![1, 3, 5, 7, 9]);
    }

    #[tokio::test]
    async fn test_persist_failures_count_as_entity_errors() {
        // Arrange
        let entities: Vec<Entity> = (1..=3).map(entity).collect();
        let cache = VecCache {
            fail_for: Some(2),
            ..VecCache::default()
        };

        // Act
        let errors =
            synchronize_concurrently(&entities, 2, &cache, |e| async move { Ok(record(e)) }).await;

        // Assert
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ServiceError::Storage(msg) if msg.starts_with("entity 2")));
        assert_eq!(cache.records.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch_returns_no_errors() {
        let cache = VecCache::default();

        let errors =
            synchronize_concurrently(&[], 4, &cache, |e| async move { Ok(record(e)) }).await;

        assert!(errors.is_empty());
    }
}
