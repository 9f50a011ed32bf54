//! WoW Hardcore stat snapshots.

use std::sync::Arc;

use async_trait::async_trait;
use leaderview_core::clock::Clock;
use leaderview_core::entity::{DataCache, Entity, Game, WowEntity, latest};
use leaderview_core::error::ServiceError;
use leaderview_core::fanout::synchronize_concurrently;
use leaderview_core::repository::DataCacheRepository;
use leaderview_core::synchronizer::{EntitySynchronizer, SYNC_CONCURRENCY};
use tracing::{info, instrument, warn};

use crate::client::{BlizzardClient, BlizzardNamespace};
use crate::domain::WowHardcoreData;

/// Snapshots Hardcore characters from the Classic profile API.
///
/// A dead character is recorded as the API reports it at death. One the API
/// no longer knows is recorded as its previous snapshot marked dead. Earlier
/// snapshots are never rewritten.
pub struct WowHardcoreEntitySynchronizer {
    blizzard: Arc<dyn BlizzardClient>,
    cache: Arc<dyn DataCacheRepository>,
    clock: Arc<dyn Clock>,
}

impl WowHardcoreEntitySynchronizer {
    /// Creates a new `WowHardcoreEntitySynchronizer`.
    #[must_use]
    pub fn new(
        blizzard: Arc<dyn BlizzardClient>,
        cache: Arc<dyn DataCacheRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            blizzard,
            cache,
            clock,
        }
    }

    async fn previous(&self, entity_id: i64) -> Result<Option<WowHardcoreData>, ServiceError> {
        let records = self
            .cache
            .get(entity_id)
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(latest(&records).and_then(|record| {
            serde_json::from_str(&record.data)
                .inspect_err(|err| warn!(entity_id, error = %err, "ignoring unreadable snapshot"))
                .ok()
        }))
    }

    async fn current(&self, character: &WowEntity) -> Result<WowHardcoreData, ServiceError> {
        let fetched = self
            .blizzard
            .get_character(
                BlizzardNamespace::Hardcore,
                &character.region,
                &character.realm,
                &character.name,
            )
            .await;

        match fetched {
            Ok(profile) => {
                if profile.is_ghost {
                    info!(entity_id = character.id, level = profile.level, "hardcore character died");
                }
                Ok(WowHardcoreData::from_profile(&profile))
            }
            Err(err) if err.is_not_found() => match self.previous(character.id).await? {
                Some(mut data) => {
                    info!(entity_id = character.id, "hardcore character gone, marking dead");
                    data.is_dead = true;
                    Ok(data)
                }
                None => Err(ServiceError::NotFound(format!(
                    "{}-{}-{}",
                    character.region, character.realm, character.name
                ))),
            },
            Err(err) => Err(err.into()),
        }
    }

    async fn snapshot(&self, entity: &Entity) -> Result<DataCache, ServiceError> {
        let Entity::WowHc(character) = entity else {
            return Err(ServiceError::SyncProcessing {
                kind: "UnsupportedGame".to_owned(),
                message: format!("entity {} is a {} entity", entity.id(), entity.game()),
            });
        };

        let data = self.current(character).await?;
        Ok(DataCache {
            entity_id: character.id,
            data: serde_json::to_string(&data).map_err(|e| ServiceError::Storage(e.to_string()))?,
            inserted: self.clock.now(),
            game: Game::WowHc,
        })
    }
}

#[async_trait]
impl EntitySynchronizer for WowHardcoreEntitySynchronizer {
    #[instrument(skip_all, fields(entities = entities.len()))]
    async fn synchronize(&self, entities: &[Entity]) -> Vec<ServiceError> {
        let errors =
            synchronize_concurrently(entities, SYNC_CONCURRENCY, self.cache.as_ref(), |entity| {
                self.snapshot(entity)
            })
            .await;
        info!(failed = errors.len(), "wow hardcore synchronization finished");
        errors
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use leaderview_test_support::{FixedClock, InMemoryDataCacheRepository};

    use super::*;
    use crate::mock::{MockBlizzardClient, profile};

    fn character(id: i64, name: &str) -> Entity {
        Entity::WowHc(WowEntity {
            id,
            name: name.to_owned(),
            region: "eu".to_owned(),
            realm: "nekrosh".to_owned(),
            blizzard_id: Some(id),
        })
    }

    fn alive_record(entity_id: i64, name: &str, level: i32) -> DataCache {
        let data = WowHardcoreData {
            name: name.to_owned(),
            level,
            class: "Warrior".to_owned(),
            race: "Orc".to_owned(),
            guild: None,
            item_level: Some(40),
            is_dead: false,
        };
        DataCache {
            entity_id,
            data: serde_json::to_string(&data).unwrap(),
            inserted: FixedClock::default().0 - Duration::hours(6),
            game: Game::WowHc,
        }
    }

    fn decode(record: &DataCache) -> WowHardcoreData {
        serde_json::from_str(&record.data).unwrap()
    }

    fn synchronizer(
        blizzard: MockBlizzardClient,
        cache: Arc<InMemoryDataCacheRepository>,
    ) -> WowHardcoreEntitySynchronizer {
        WowHardcoreEntitySynchronizer::new(Arc::new(blizzard), cache, Arc::new(FixedClock::default()))
    }

    #[tokio::test]
    async fn test_death_appends_a_dead_snapshot_and_keeps_the_old_one() {
        // Arrange
        let mut dead = profile(1, "Grimbly", "nekrosh", 42);
        dead.is_ghost = true;
        let cache = Arc::new(InMemoryDataCacheRepository::with_records(vec![alive_record(
            1, "Grimbly", 41,
        )]));
        let sync = synchronizer(MockBlizzardClient::default().with_character("eu", dead), cache.clone());

        // Act
        let errors = sync.synchronize(&[character(1, "Grimbly")]).await;

        // Assert
        assert!(errors.is_empty());
        let records = cache.records();
        assert_eq!(records.len(), 2);
        assert!(!decode(&records[0]).is_dead, "old record retained as is");
        let newest = decode(latest(&records).unwrap());
        assert!(newest.is_dead);
        assert_eq!(newest.level, 42, "level at death recorded");
    }

    #[tokio::test]
    async fn test_vanished_character_reuses_previous_snapshot() {
        // Arrange
        let cache = Arc::new(InMemoryDataCacheRepository::with_records(vec![alive_record(
            1, "Grimbly", 41,
        )]));
        let sync = synchronizer(MockBlizzardClient::default(), cache.clone());

        // Act
        let errors = sync.synchronize(&[character(1, "Grimbly")]).await;

        // Assert
        assert!(errors.is_empty());
        assert!(decode(latest(&cache.records()).unwrap()).is_dead);
    }

    #[tokio::test]
    async fn test_unknown_character_without_history_is_not_found() {
        // Arrange
        let cache = Arc::new(InMemoryDataCacheRepository::new());
        let sync = synchronizer(
            MockBlizzardClient::default().with_character("eu", profile(2, "Kez", "nekrosh", 12)),
            cache.clone(),
        );

        // Act
        let errors = sync.synchronize(&[character(1, "Nobody"), character(2, "Kez")]).await;

        // Assert
        assert_eq!(errors, vec![ServiceError::NotFound("eu-nekrosh-Nobody".into())]);
        let records = cache.records();
        assert_eq!(records.len(), 1);
        let alive = decode(&records[0]);
        assert_eq!(alive.level, 12);
        assert!(!alive.is_dead);
    }
}
