//! Refreshes the identity of tracked LoL accounts.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use leaderview_core::entity::{Entity, Game, InsertEntityRequest, LolEntity, LolInsertRequest};
use leaderview_core::error::{DomainError, ServiceError};
use leaderview_core::repository::EntityRepository;
use leaderview_core::synchronizer::SYNC_CONCURRENCY;
use tracing::{debug, info, instrument, warn};

use crate::client::RiotClient;

/// Keeps Riot ids, icons and levels of tracked accounts current. Accounts
/// are looked up by PUUID, which survives renames.
pub struct LolEntityUpdater {
    riot: Arc<dyn RiotClient>,
    entities: Arc<dyn EntityRepository>,
}

impl LolEntityUpdater {
    /// Creates a new `LolEntityUpdater`.
    #[must_use]
    pub fn new(riot: Arc<dyn RiotClient>, entities: Arc<dyn EntityRepository>) -> Self {
        Self { riot, entities }
    }

    /// Updates every tracked LoL account.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the tracked accounts cannot be loaded.
    /// Per-account failures are returned in the `Ok` value.
    pub async fn update_all(&self) -> Result<Vec<ServiceError>, DomainError> {
        let entities = self.entities.get_all(Game::Lol).await?;
        Ok(self.update(&entities).await)
    }

    /// Updates `entities`, skipping those that are not LoL accounts. Returns
    /// one error per account that could not be refreshed.
    #[instrument(skip_all, fields(entities = entities.len()))]
    pub async fn update(&self, entities: &[Entity]) -> Vec<ServiceError> {
        let accounts = entities.iter().filter_map(|e| match e {
            Entity::Lol(account) => Some(account),
            _ => None,
        });

        let updates: Vec<_> = accounts.map(|account| self.update_one(account)).collect();

        let errors: Vec<ServiceError> = stream::iter(updates)
            .buffer_unordered(SYNC_CONCURRENCY)
            .filter_map(|result| async move { result.err() })
            .collect()
            .await;

        for err in &errors {
            warn!(error = %err, "lol account update failed");
        }
        info!(failed = errors.len(), "lol accounts updated");
        errors
    }

    async fn update_one(&self, current: &LolEntity) -> Result<(), ServiceError> {
        let account = self.riot.get_account_by_puuid(&current.puuid).await?;
        let summoner = self.riot.get_summoner(&current.puuid).await?;
        let fresh = LolInsertRequest {
            name: account.game_name,
            tag: account.tag_line,
            puuid: current.puuid.clone(),
            summoner_id: summoner.id,
            summoner_icon: summoner.profile_icon_id,
            summoner_level: summoner.summoner_level,
        };

        let unchanged = fresh.name == current.name
            && fresh.tag == current.tag
            && fresh.summoner_id == current.summoner_id
            && fresh.summoner_icon == current.summoner_icon
            && fresh.summoner_level == current.summoner_level;
        if unchanged {
            debug!(entity_id = current.id, "lol account unchanged");
            return Ok(());
        }

        self.entities
            .update(current.id, &InsertEntityRequest::Lol(fresh))
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))
    }
}
