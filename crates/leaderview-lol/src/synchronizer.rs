//! LoL stat snapshots.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use leaderview_core::clock::Clock;
use leaderview_core::entity::{DataCache, Entity, Game, LolEntity, latest};
use leaderview_core::error::{ClientError, ServiceError};
use leaderview_core::fanout::synchronize_concurrently;
use leaderview_core::repository::DataCacheRepository;
use leaderview_core::synchronizer::{EntitySynchronizer, SYNC_CONCURRENCY};
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::client::RiotClient;
use crate::domain::{LolData, LolLeague, MatchDetails, MatchSummary};

/// Matches listed per ranked queue.
pub const MATCHES_PER_QUEUE: usize = 20;

/// Match details fetched during one synchronization run, keyed by match id.
/// Concurrent requests for the same match share a single fetch.
#[derive(Default)]
struct MatchCache {
    cells: Mutex<HashMap<String, Arc<OnceCell<MatchDetails>>>>,
    hits: AtomicU64,
    fetches: AtomicU64,
}

impl MatchCache {
    async fn get_or_fetch<F, Fut>(&self, match_id: &str, fetch: F) -> Result<MatchDetails, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MatchDetails, ClientError>>,
    {
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cells.entry(match_id.to_owned()).or_default())
        };

        let mut fetched = false;
        let details = cell
            .get_or_try_init(|| {
                fetched = true;
                fetch()
            })
            .await?;
        let counter = if fetched { &self.fetches } else { &self.hits };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(details.clone())
    }

    #[allow(clippy::cast_precision_loss)]
    fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits + self.fetches.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Snapshots ranked standings and recent ranked matches of LoL accounts.
///
/// Only matches missing from an account's latest snapshot are requested;
/// the others are carried over from it.
pub struct LolEntitySynchronizer {
    riot: Arc<dyn RiotClient>,
    cache: Arc<dyn DataCacheRepository>,
    clock: Arc<dyn Clock>,
    matches_per_queue: usize,
}

impl LolEntitySynchronizer {
    /// Creates a new `LolEntitySynchronizer`.
    #[must_use]
    pub fn new(
        riot: Arc<dyn RiotClient>,
        cache: Arc<dyn DataCacheRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            riot,
            cache,
            clock,
            matches_per_queue: MATCHES_PER_QUEUE,
        }
    }

    /// Overrides how many recent matches are read per ranked queue.
    #[must_use]
    pub fn with_matches_per_queue(mut self, matches_per_queue: usize) -> Self {
        self.matches_per_queue = matches_per_queue;
        self
    }

    async fn snapshot(&self, entity: &Entity, matches: &MatchCache) -> Result<DataCache, ServiceError> {
        let Entity::Lol(player) = entity else {
            return Err(ServiceError::SyncProcessing {
                kind: "UnsupportedGame".to_owned(),
                message: format!("entity {} is a {} entity", entity.id(), entity.game()),
            });
        };

        let previous = self.previous(player.id).await?;
        let entries = self.riot.get_leagues(&player.puuid).await?;

        let mut leagues = Vec::with_capacity(entries.len());
        for entry in entries {
            let recent = match entry.queue_id() {
                Some(queue) => {
                    let known = previous
                        .as_ref()
                        .map(|p| p.matches(&entry.queue_type))
                        .unwrap_or_default();
                    self.recent_matches(player, queue, known, matches).await?
                }
                None => Vec::new(),
            };
            leagues.push(LolLeague {
                queue_type: entry.queue_type,
                tier: entry.tier,
                rank: entry.rank,
                league_points: entry.league_points,
                wins: entry.wins,
                losses: entry.losses,
                matches: recent,
            });
        }

        let data = LolData {
            summoner_icon: player.summoner_icon,
            summoner_level: player.summoner_level,
            leagues,
        };
        Ok(DataCache {
            entity_id: player.id,
            data: serde_json::to_string(&data).map_err(|e| ServiceError::Storage(e.to_string()))?,
            inserted: self.clock.now(),
            game: Game::Lol,
        })
    }

    async fn previous(&self, entity_id: i64) -> Result<Option<LolData>, ServiceError> {
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

    async fn recent_matches(
        &self,
        player: &LolEntity,
        queue: i32,
        known: &[MatchSummary],
        matches: &MatchCache,
    ) -> Result<Vec<MatchSummary>, ServiceError> {
        let ids = self
            .riot
            .get_match_ids(&player.puuid, queue, self.matches_per_queue)
            .await?;
        let known: HashMap<&str, &MatchSummary> =
            known.iter().map(|m| (m.match_id.as_str(), m)).collect();

        let mut summaries = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(summary) = known.get(id.as_str()) {
                summaries.push((*summary).clone());
                continue;
            }
            let details = matches
                .get_or_fetch(id, || self.riot.get_match(id))
                .await?;
            if let Some(summary) = MatchSummary::of(&details, &player.puuid) {
                summaries.push(summary);
            }
        }
        Ok(summaries)
    }
}

#[async_trait]
impl EntitySynchronizer for LolEntitySynchronizer {
    #[instrument(skip_all, fields(entities = entities.len()))]
    async fn synchronize(&self, entities: &[Entity]) -> Vec<ServiceError> {
        let matches = MatchCache::default();
        let errors = synchronize_concurrently(entities, SYNC_CONCURRENCY, self.cache.as_ref(), |entity| {
            self.snapshot(entity, &matches)
        })
        .await;
        info!(
            failed = errors.len(),
            match_fetches = matches.fetches.load(Ordering::Relaxed),
            match_hit_rate = matches.hit_rate(),
            "lol synchronization finished"
        );
        errors
    }
}

#[cfg(test)]
mod tests {
    use leaderview_core::entity::{InsertEntityRequest, LolInsertRequest, WowEntity};
    use leaderview_test_support::{FixedClock, InMemoryDataCacheRepository};

    use super::*;
    use crate::mock::MockRiotClient;

    fn player(id: i64, puuid: &str) -> Entity {
        Entity::from_insert(
            id,
            &InsertEntityRequest::Lol(LolInsertRequest {
                name: format!("player{id}"),
                tag: "EUW".to_owned(),
                puuid: puuid.to_owned(),
                summoner_id: format!("s-{puuid}"),
                summoner_icon: 3,
                summoner_level: 120,
            }),
        )
    }

    fn synchronizer(
        riot: MockRiotClient,
        cache: Arc<InMemoryDataCacheRepository>,
    ) -> (LolEntitySynchronizer, Arc<MockRiotClient>) {
        let riot = Arc::new(riot);
        let sync = LolEntitySynchronizer::new(riot.clone(), cache, Arc::new(FixedClock::default()));
        (sync, riot)
    }

    fn decode(record: &DataCache) -> LolData {
        serde_json::from_str(&record.data).unwrap()
    }

    #[tokio::test]
    async fn test_shared_matches_are_fetched_once_per_run() {
        // Arrange
        let riot = MockRiotClient::default()
            .with_league("pa", "RANKED_SOLO_5x5", &["m1", "m2"])
            .with_league("pb", "RANKED_SOLO_5x5", &["m1"])
            .with_match("m1", &["pa", "pb"])
            .with_match("m2", &["pa"]);
        let cache = Arc::new(InMemoryDataCacheRepository::new());
        let (sync, riot) = synchronizer(riot, cache.clone());

        // Act
        let errors = sync.synchronize(&[player(1, "pa"), player(2, "pb")]).await;

        // Assert
        assert!(errors.is_empty());
        let mut requested = riot.match_requests();
        requested.sort();
        assert_eq!(requested, vec!["m1", "m2"]);
        let records = cache.records();
        assert_eq!(records.len(), 2);
        let first = records.iter().find(|r| r.entity_id == 1).unwrap();
        let data = decode(first);
        assert_eq!(data.summoner_level, 120);
        assert_eq!(data.matches("RANKED_SOLO_5x5").len(), 2);
    }

    #[tokio::test]
    async fn test_matches_in_the_latest_snapshot_are_not_refetched() {
        // Arrange
        let previous = LolData {
            summoner_icon: 3,
            summoner_level: 119,
            leagues: vec![LolLeague {
                queue_type: "RANKED_SOLO_5x5".to_owned(),
                tier: "GOLD".to_owned(),
                rank: "III".to_owned(),
                league_points: 10,
                wins: 9,
                losses: 8,
                matches: vec![MatchSummary {
                    match_id: "m1".to_owned(),
                    game_creation: 1,
                    game_duration: 2,
                    champion_name: "Lux".to_owned(),
                    kills: 0,
                    deaths: 0,
                    assists: 0,
                    win: false,
                }],
            }],
        };
        let cache = Arc::new(InMemoryDataCacheRepository::with_records(vec![DataCache {
            entity_id: 1,
            data: serde_json::to_string(&previous).unwrap(),
            inserted: FixedClock::default().0 - chrono::Duration::hours(1),
            game: Game::Lol,
        }]));
        let riot = MockRiotClient::default()
            .with_league("pa", "RANKED_SOLO_5x5", &["m2", "m1"])
            .with_match("m1", &["pa"])
            .with_match("m2", &["pa"]);
        let (sync, riot) = synchronizer(riot, cache.clone());

        // Act
        let errors = sync.synchronize(&[player(1, "pa")]).await;

        // Assert
        assert!(errors.is_empty());
        assert_eq!(riot.match_requests(), vec!["m2"]);
        let records = cache.records();
        assert_eq!(records.len(), 2, "previous snapshot retained");
        let newest = decode(latest(&records).unwrap());
        let recent = newest.matches("RANKED_SOLO_5x5");
        let ids: Vec<&str> = recent.iter().map(|m| m.match_id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m1"]);
        assert_eq!(recent[1].champion_name, "Lux", "carried over from the snapshot");
    }

    #[tokio::test]
    async fn test_failures_are_returned_per_entity() {
        // Arrange
        let riot = MockRiotClient::default()
            .with_league("pa", "RANKED_SOLO_5x5", &["missing"])
            .with_league("pb", "RANKED_FLEX_SR", &[]);
        let cache = Arc::new(InMemoryDataCacheRepository::new());
        let (sync, _) = synchronizer(riot, cache.clone());
        let wow = Entity::Wow(WowEntity {
            id: 3,
            name: "Thrall".into(),
            region: "eu".into(),
            realm: "draenor".into(),
            blizzard_id: None,
        });

        // Act
        let errors = sync.synchronize(&[player(1, "pa"), player(2, "pb"), wow]).await;

        // Assert
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(
            e,
            ServiceError::SyncProcessing { kind, .. } if kind == "HttpError"
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ServiceError::SyncProcessing { kind, .. } if kind == "UnsupportedGame"
        )));
        let records = cache.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entity_id, 2);
    }
}
