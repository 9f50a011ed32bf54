//! Riot id validation.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use leaderview_core::entity::{
    CreateEntityRequest, DroppedRequest, Entity, ExtraArguments, Game, InsertEntityRequest,
    LolEntityRequest, LolInsertRequest, ResolvedEntities,
};
use leaderview_core::error::{ClientError, DomainError, ServiceError};
use leaderview_core::repository::EntityRepository;
use leaderview_core::resolver::{
    EntityResolver, FOLLOW_UP_CONCURRENCY, LOOKUP_CONCURRENCY, VALIDATION_CONCURRENCY,
};
use tracing::{info, instrument, warn};

use crate::client::RiotClient;
use crate::domain::RiotAccount;

/// Resolves Riot ids (`name#tag`) into LoL entities.
///
/// Requests are first matched against tracked entities by name and tag. The
/// rest are looked up on the account API and enriched with the summoner
/// profile. An account whose PUUID is already tracked under an older Riot id
/// resolves to the tracked entity.
pub struct LolEntityResolver {
    riot: Arc<dyn RiotClient>,
    entities: Arc<dyn EntityRepository>,
}

fn storage(err: DomainError) -> ServiceError {
    ServiceError::Storage(err.to_string())
}

impl LolEntityResolver {
    /// Creates a new `LolEntityResolver`.
    #[must_use]
    pub fn new(riot: Arc<dyn RiotClient>, entities: Arc<dyn EntityRepository>) -> Self {
        Self { riot, entities }
    }

    async fn validate(
        &self,
        requests: Vec<LolEntityRequest>,
    ) -> Vec<(LolEntityRequest, Result<LolInsertRequest, ClientError>)> {
        let accounts: Vec<(LolEntityRequest, Result<RiotAccount, ClientError>)> =
            stream::iter(requests)
                .map(|request| async move {
                    let account = self.riot.get_account(&request.name, &request.tag).await;
                    (request, account)
                })
                .buffered(VALIDATION_CONCURRENCY)
                .collect()
                .await;

        stream::iter(accounts)
            .map(|(request, account)| async move {
                let insert = match account {
                    Ok(account) => self.enrich(account).await,
                    Err(err) => Err(err),
                };
                (request, insert)
            })
            .buffered(FOLLOW_UP_CONCURRENCY)
            .collect()
            .await
    }

    async fn enrich(&self, account: RiotAccount) -> Result<LolInsertRequest, ClientError> {
        let summoner = self.riot.get_summoner(&account.puuid).await?;
        Ok(LolInsertRequest {
            name: account.game_name,
            tag: account.tag_line,
            puuid: account.puuid,
            summoner_id: summoner.id,
            summoner_icon: summoner.profile_icon_id,
            summoner_level: summoner.summoner_level,
        })
    }
}

#[async_trait]
impl EntityResolver for LolEntityResolver {
    #[instrument(skip_all, fields(requested = requested.len()))]
    async fn resolve(
        &self,
        requested: Vec<CreateEntityRequest>,
        _extra: Option<&ExtraArguments>,
    ) -> Result<ResolvedEntities, ServiceError> {
        let mut resolved = ResolvedEntities::default();

        let lookups: Vec<(CreateEntityRequest, Result<Option<Entity>, DomainError>)> =
            stream::iter(requested)
                .map(|request| async move {
                    let found = self.entities.get(&request).await;
                    (request, found)
                })
                .buffered(LOOKUP_CONCURRENCY)
                .collect()
                .await;

        let mut new = Vec::new();
        for (request, found) in lookups {
            match (found.map_err(storage)?, request) {
                (Some(entity), request) => {
                    let alias = request.alias().map(str::to_owned);
                    resolved.existing.push((entity, alias));
                }
                (None, CreateEntityRequest::Lol(request)) => new.push(request),
                (None, request) => resolved.dropped.push(DroppedRequest {
                    reason: format!("{} request sent to the LoL resolver", request.game()),
                    request,
                }),
            }
        }

        for (request, insert) in self.validate(new).await {
            match insert {
                Ok(insert) => {
                    let alias = request.alias.clone();
                    match self
                        .entities
                        .get_by_external_key(Game::Lol, &insert.puuid)
                        .await
                        .map_err(storage)?
                    {
                        Some(entity) => resolved.existing.push((entity, alias)),
                        None => resolved
                            .entities
                            .push((InsertEntityRequest::Lol(insert), alias)),
                    }
                }
                Err(err) => {
                    warn!(
                        request = %format!("{}#{}", request.name, request.tag),
                        error = %err,
                        "dropping unresolvable riot id"
                    );
                    resolved.dropped.push(DroppedRequest {
                        request: CreateEntityRequest::Lol(request),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            existing = resolved.existing.len(),
            new = resolved.entities.len(),
            dropped = resolved.dropped.len(),
            "lol entities resolved"
        );
        Ok(resolved)
    }
}
