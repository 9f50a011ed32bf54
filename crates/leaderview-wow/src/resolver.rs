//! Character and guild validation.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use leaderview_core::entity::{
    CreateEntityRequest, DroppedRequest, Entity, ExtraArguments, Game, GuildPayload,
    InsertEntityRequest, ResolvedEntities, WowEntityRequest, WowInsertRequest, wow_key,
};
use leaderview_core::error::{ClientError, DomainError, ServiceError};
use leaderview_core::repository::EntityRepository;
use leaderview_core::resolver::{EntityResolver, LOOKUP_CONCURRENCY, VALIDATION_CONCURRENCY};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::client::{BlizzardClient, BlizzardNamespace};

/// Guild members below this level are not tracked.
pub const MIN_GUILD_MEMBER_LEVEL: i32 = 10;

/// Why a requested character is not tracked.
#[derive(Debug, Error)]
enum Rejection {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("character {0} is dead")]
    Dead(String),
}

fn storage(err: DomainError) -> ServiceError {
    ServiceError::Storage(err.to_string())
}

/// Resolves WoW characters of one game (retail or Hardcore) against the
/// Blizzard profile API.
///
/// For Hardcore guild views the single request names a guild: its roster is
/// fetched and every member of at least [`MIN_GUILD_MEMBER_LEVEL`] is
/// resolved in its place. A failed roster fetch fails the whole call.
pub struct WowEntityResolver {
    game: Game,
    blizzard: Arc<dyn BlizzardClient>,
    entities: Arc<dyn EntityRepository>,
}

impl WowEntityResolver {
    /// Resolver for retail characters.
    #[must_use]
    pub fn retail(blizzard: Arc<dyn BlizzardClient>, entities: Arc<dyn EntityRepository>) -> Self {
        Self {
            game: Game::Wow,
            blizzard,
            entities,
        }
    }

    /// Resolver for Hardcore characters and guilds.
    #[must_use]
    pub fn hardcore(
        blizzard: Arc<dyn BlizzardClient>,
        entities: Arc<dyn EntityRepository>,
    ) -> Self {
        Self {
            game: Game::WowHc,
            blizzard,
            entities,
        }
    }

    fn namespace(&self) -> BlizzardNamespace {
        BlizzardNamespace::for_game(self.game)
    }

    fn create_request(&self, request: WowEntityRequest) -> CreateEntityRequest {
        match self.game {
            Game::WowHc => CreateEntityRequest::WowHc(request),
            Game::Wow | Game::Lol => CreateEntityRequest::Wow(request),
        }
    }

    fn insert_request(&self, request: WowInsertRequest) -> InsertEntityRequest {
        match self.game {
            Game::WowHc => InsertEntityRequest::WowHc(request),
            Game::Wow | Game::Lol => InsertEntityRequest::Wow(request),
        }
    }

    fn own_request(&self, request: CreateEntityRequest) -> Result<WowEntityRequest, CreateEntityRequest> {
        match (self.game, request) {
            (Game::Wow, CreateEntityRequest::Wow(r)) | (Game::WowHc, CreateEntityRequest::WowHc(r)) => {
                Ok(r)
            }
            (_, other) => Err(other),
        }
    }

    async fn expand_guild(
        &self,
        requested: Vec<CreateEntityRequest>,
    ) -> Result<(Vec<CreateEntityRequest>, GuildPayload), ServiceError> {
        let count = requested.len();
        let mut requested = requested.into_iter();
        let guild = match (requested.next().map(|r| self.own_request(r)), count) {
            (Some(Ok(guild)), 1) => guild,
            _ => {
                return Err(ServiceError::SyncProcessing {
                    kind: "InvalidGuildRequest".to_owned(),
                    message: format!(
                        "a guild view needs exactly one {} guild request, got {count}",
                        self.game
                    ),
                });
            }
        };

        let roster = self
            .blizzard
            .get_guild_roster(self.namespace(), &guild.region, &guild.realm, &guild.name)
            .await?;

        let total = roster.members.len();
        let members: Vec<CreateEntityRequest> = roster
            .members
            .into_iter()
            .filter(|m| m.character.level >= MIN_GUILD_MEMBER_LEVEL)
            .map(|m| {
                self.create_request(WowEntityRequest {
                    name: m.character.name,
                    region: guild.region.clone(),
                    realm: m.character.realm.slug,
                    alias: None,
                })
            })
            .collect();
        info!(
            guild = %roster.guild.name,
            roster = total,
            tracked = members.len(),
            "guild roster expanded"
        );

        let payload = GuildPayload {
            name: roster.guild.name,
            realm: roster.guild.realm.slug,
            region: guild.region,
            blizzard_id: roster.guild.id,
        };
        Ok((members, payload))
    }

    async fn validate(&self, request: &WowEntityRequest) -> Result<WowInsertRequest, Rejection> {
        let profile = self
            .blizzard
            .get_character(self.namespace(), &request.region, &request.realm, &request.name)
            .await?;
        if self.game == Game::WowHc && profile.is_ghost {
            return Err(Rejection::Dead(profile.name));
        }
        Ok(WowInsertRequest {
            name: profile.name,
            region: request.region.to_lowercase(),
            realm: profile.realm.slug,
            blizzard_id: Some(profile.id),
        })
    }
}

#[async_trait]
impl EntityResolver for WowEntityResolver {
    #[instrument(skip_all, fields(game = %self.game, requested = requested.len()))]
    async fn resolve(
        &self,
        requested: Vec<CreateEntityRequest>,
        extra: Option<&ExtraArguments>,
    ) -> Result<ResolvedEntities, ServiceError> {
        let mut resolved = ResolvedEntities::default();

        let is_guild = self.game == Game::WowHc && extra.is_some_and(|e| e.is_guild);
        let requested = if is_guild {
            let (members, guild) = self.expand_guild(requested).await?;
            resolved.guild = Some(guild);
            members
        } else {
            requested
        };

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
            if let Some(entity) = found.map_err(storage)? {
                let alias = request.alias().map(str::to_owned);
                resolved.existing.push((entity, alias));
                continue;
            }
            match self.own_request(request) {
                Ok(request) => new.push(request),
                Err(request) => resolved.dropped.push(DroppedRequest {
                    reason: format!("{} request sent to the {} resolver", request.game(), self.game),
                    request,
                }),
            }
        }

        let validated: Vec<(WowEntityRequest, Result<WowInsertRequest, Rejection>)> =
            stream::iter(new)
                .map(|request| async move {
                    let insert = self.validate(&request).await;
                    (request, insert)
                })
                .buffered(VALIDATION_CONCURRENCY)
                .collect()
                .await;

        for (request, insert) in validated {
            match insert {
                Ok(insert) => {
                    let alias = request.alias.clone();
                    let key = wow_key(&insert.region, &insert.realm, &insert.name);
                    match self
                        .entities
                        .get_by_external_key(self.game, &key)
                        .await
                        .map_err(storage)?
                    {
                        Some(entity) => resolved.existing.push((entity, alias)),
                        None => resolved.entities.push((self.insert_request(insert), alias)),
                    }
                }
                Err(err) => {
                    let request = self.create_request(request);
                    warn!(
                        request = %request.describe(),
                        error = %err,
                        "dropping unresolvable character"
                    );
                    resolved.dropped.push(DroppedRequest {
                        request,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            existing = resolved.existing.len(),
            new = resolved.entities.len(),
            dropped = resolved.dropped.len(),
            "wow entities resolved"
        );
        Ok(resolved)
    }
}
