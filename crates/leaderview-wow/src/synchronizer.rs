//! WoW retail stat snapshots.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use leaderview_core::clock::Clock;
use leaderview_core::entity::{DataCache, Entity, Game};
use leaderview_core::error::ServiceError;
use leaderview_core::fanout::synchronize_concurrently;
use leaderview_core::repository::DataCacheRepository;
use leaderview_core::synchronizer::{EntitySynchronizer, SYNC_CONCURRENCY};
use tracing::{info, instrument, warn};

use crate::client::RaiderIoClient;
use crate::domain::{SeasonCutoffs, WowData};

/// Snapshots Mythic+ scores of retail characters from RaiderIO.
///
/// Season cutoffs are fetched once per region per run and shared by every
/// character of that region. A region whose cutoffs are unavailable still
/// gets snapshots, without a percentile.
pub struct WowEntitySynchronizer {
    raider_io: Arc<dyn RaiderIoClient>,
    cache: Arc<dyn DataCacheRepository>,
    clock: Arc<dyn Clock>,
}

impl WowEntitySynchronizer {
    /// Creates a new `WowEntitySynchronizer`.
    #[must_use]
    pub fn new(
        raider_io: Arc<dyn RaiderIoClient>,
        cache: Arc<dyn DataCacheRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            raider_io,
            cache,
            clock,
        }
    }

    async fn season_cutoffs(&self, entities: &[Entity]) -> HashMap<String, SeasonCutoffs> {
        let regions: BTreeSet<String> = entities
            .iter()
            .filter_map(|e| match e {
                Entity::Wow(c) => Some(c.region.to_lowercase()),
                _ => None,
            })
            .collect();

        let mut cutoffs = HashMap::with_capacity(regions.len());
        for region in regions {
            match self.raider_io.get_season_cutoffs(&region).await {
                Ok(table) => {
                    cutoffs.insert(region, table);
                }
                Err(err) => {
                    warn!(region = %region, error = %err, "season cutoffs unavailable");
                }
            }
        }
        cutoffs
    }

    async fn snapshot(
        &self,
        entity: &Entity,
        cutoffs: &HashMap<String, SeasonCutoffs>,
    ) -> Result<DataCache, ServiceError> {
        let Entity::Wow(character) = entity else {
            return Err(ServiceError::SyncProcessing {
                kind: "UnsupportedGame".to_owned(),
                message: format!("entity {} is a {} entity", entity.id(), entity.game()),
            });
        };

        let profile = self
            .raider_io
            .get_profile(&character.region, &character.realm, &character.name)
            .await?;
        let score = profile.current_score();
        let data = WowData {
            score,
            class: profile.class,
            spec: profile.active_spec_name,
            item_level: profile.gear.map(|g| g.item_level_equipped),
            top_percent: cutoffs
                .get(&character.region.to_lowercase())
                .and_then(|c| c.top_percent(score)),
        };

        Ok(DataCache {
            entity_id: character.id,
            data: serde_json::to_string(&data).map_err(|e| ServiceError::Storage(e.to_string()))?,
            inserted: self.clock.now(),
            game: Game::Wow,
        })
    }
}

#[async_trait]
impl EntitySynchronizer for WowEntitySynchronizer {
    #[instrument(skip_all, fields(entities = entities.len()))]
    async fn synchronize(&self, entities: &[Entity]) -> Vec<ServiceError> {
        let cutoffs = self.season_cutoffs(entities).await;
        let errors = synchronize_concurrently(entities, SYNC_CONCURRENCY, self.cache.as_ref(), |entity| {
            self.snapshot(entity, &cutoffs)
        })
        .await;
        info!(failed = errors.len(), "wow synchronization finished");
        errors
    }
}

#[cfg(test)]
mod tests {
    use leaderview_core::entity::WowEntity;
    use leaderview_test_support::{FixedClock, InMemoryDataCacheRepository};

    use super::*;
    use crate::mock::MockRaiderIoClient;

    fn character(id: i64, region: &str, name: &str) -> Entity {
        Entity::Wow(WowEntity {
            id,
            name: name.to_owned(),
            region: region.to_owned(),
            realm: "draenor".to_owned(),
            blizzard_id: None,
        })
    }

    fn decode(record: &DataCache) -> WowData {
        serde_json::from_str(&record.data).unwrap()
    }

    #[tokio::test]
    async fn test_cutoffs_are_fetched_once_per_region() {
        // Arrange
        let raider_io = Arc::new(
            MockRaiderIoClient::default()
                .with_score("eu", "draenor", "A", 3600.0)
                .with_score("eu", "draenor", "B", 2900.0)
                .with_score("us", "draenor", "C", 100.0)
                .with_cutoffs("eu", 3500.0, 3200.0, 2800.0)
                .with_cutoffs("us", 3500.0, 3200.0, 2800.0),
        );
        let cache = Arc::new(InMemoryDataCacheRepository::new());
        let sync = WowEntitySynchronizer::new(
            raider_io.clone(),
            cache.clone(),
            Arc::new(FixedClock::default()),
        );

        // Act
        let errors = sync
            .synchronize(&[character(1, "eu", "A"), character(2, "eu", "B"), character(3, "us", "C")])
            .await;

        // Assert
        assert!(errors.is_empty());
        assert_eq!(raider_io.cutoff_requests(), vec!["eu", "us"]);
        let records = cache.records();
        let top = |id| decode(records.iter().find(|r| r.entity_id == id).unwrap()).top_percent;
        assert_eq!(top(1), Some(0.1));
        assert_eq!(top(2), Some(10.0));
        assert_eq!(top(3), None);
    }

    #[tokio::test]
    async fn test_missing_cutoffs_still_snapshot_without_percentile() {
        // Arrange
        let raider_io = MockRaiderIoClient::default().with_score("eu", "draenor", "A", 3000.0);
        let cache = Arc::new(InMemoryDataCacheRepository::new());
        let sync = WowEntitySynchronizer::new(
            Arc::new(raider_io),
            cache.clone(),
            Arc::new(FixedClock::default()),
        );

        // Act
        let errors = sync.synchronize(&[character(1, "eu", "A"), character(2, "eu", "Unknown")]).await;

        // Assert
        assert_eq!(errors.len(), 1);
        let records = cache.records();
        assert_eq!(records.len(), 1);
        let data = decode(&records[0]);
        assert!((data.score - 3000.0).abs() < f64::EPSILON);
        assert_eq!(data.top_percent, None);
        assert_eq!(records[0].inserted, FixedClock::default().0);
    }
}
