//! Tracked game characters and the requests that create them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A supported game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Game {
    /// World of Warcraft retail.
    Wow,
    /// World of Warcraft classic hardcore realms.
    WowHc,
    /// League of Legends.
    Lol,
}

impl Game {
    /// Every supported game, in a stable order.
    pub const ALL: [Game; 3] = [Game::Wow, Game::WowHc, Game::Lol];

    /// Storage/wire name of the game.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Game::Wow => "WOW",
            Game::WowHc => "WOW_HC",
            Game::Lol => "LOL",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Game {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WOW" => Ok(Game::Wow),
            "WOW_HC" => Ok(Game::WowHc),
            "LOL" => Ok(Game::Lol),
            other => Err(format!("unknown game: {other}")),
        }
    }
}

/// A WoW character as requested by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WowEntityRequest {
    /// Character name.
    pub name: String,
    /// Region slug (`eu`, `us`, ...).
    pub region: String,
    /// Realm slug.
    pub realm: String,
    /// Display alias inside the view.
    #[serde(default)]
    pub alias: Option<String>,
}

/// A League of Legends account as requested by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LolEntityRequest {
    /// Riot game name.
    pub name: String,
    /// Riot tag line.
    pub tag: String,
    /// Display alias inside the view.
    #[serde(default)]
    pub alias: Option<String>,
}

/// Unresolved request to track a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateEntityRequest {
    /// WoW retail character.
    Wow(WowEntityRequest),
    /// WoW hardcore character (or guild, when resolving a guild view).
    WowHc(WowEntityRequest),
    /// LoL account.
    Lol(LolEntityRequest),
}

impl CreateEntityRequest {
    /// The game this request belongs to.
    #[must_use]
    pub fn game(&self) -> Game {
        match self {
            Self::Wow(_) => Game::Wow,
            Self::WowHc(_) => Game::WowHc,
            Self::Lol(_) => Game::Lol,
        }
    }

    /// The requested display alias.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Wow(r) | Self::WowHc(r) => r.alias.as_deref(),
            Self::Lol(r) => r.alias.as_deref(),
        }
    }

    /// Human-readable identity used in logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Wow(r) | Self::WowHc(r) => format!("{}-{}-{}", r.region, r.realm, r.name),
            Self::Lol(r) => format!("{}#{}", r.name, r.tag),
        }
    }
}

/// A WoW character validated against the Blizzard/RaiderIO APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WowInsertRequest {
    /// Character name.
    pub name: String,
    /// Region slug.
    pub region: String,
    /// Realm slug.
    pub realm: String,
    /// Blizzard character id, when known.
    pub blizzard_id: Option<i64>,
}

/// A LoL account validated against the Riot API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LolInsertRequest {
    /// Riot game name.
    pub name: String,
    /// Riot tag line.
    pub tag: String,
    /// Riot PUUID.
    pub puuid: String,
    /// Encrypted summoner id.
    pub summoner_id: String,
    /// Profile icon id.
    pub summoner_icon: i32,
    /// Summoner level.
    pub summoner_level: i64,
}

/// Resolved request ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsertEntityRequest {
    /// WoW retail character.
    Wow(WowInsertRequest),
    /// WoW hardcore character.
    WowHc(WowInsertRequest),
    /// LoL account.
    Lol(LolInsertRequest),
}

impl InsertEntityRequest {
    /// The game this request belongs to.
    #[must_use]
    pub fn game(&self) -> Game {
        match self {
            Self::Wow(_) => Game::Wow,
            Self::WowHc(_) => Game::WowHc,
            Self::Lol(_) => Game::Lol,
        }
    }

    /// The external identity entities are unique on.
    #[must_use]
    pub fn external_key(&self) -> String {
        match self {
            Self::Wow(r) | Self::WowHc(r) => wow_key(&r.region, &r.realm, &r.name),
            Self::Lol(r) => r.puuid.clone(),
        }
    }

    /// The user-facing request this insert was resolved from.
    #[must_use]
    pub fn to_create_request(&self, alias: Option<String>) -> CreateEntityRequest {
        match self {
            Self::Wow(r) => CreateEntityRequest::Wow(WowEntityRequest {
                name: r.name.clone(),
                region: r.region.clone(),
                realm: r.realm.clone(),
                alias,
            }),
            Self::WowHc(r) => CreateEntityRequest::WowHc(WowEntityRequest {
                name: r.name.clone(),
                region: r.region.clone(),
                realm: r.realm.clone(),
                alias,
            }),
            Self::Lol(r) => CreateEntityRequest::Lol(LolEntityRequest {
                name: r.name.clone(),
                tag: r.tag.clone(),
                alias,
            }),
        }
    }
}

/// Case-insensitive identity of a WoW character.
#[must_use]
pub fn wow_key(region: &str, realm: &str, name: &str) -> String {
    format!(
        "{}/{}/{}",
        region.to_lowercase(),
        realm.to_lowercase(),
        name.to_lowercase()
    )
}

/// A tracked WoW character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WowEntity {
    /// Entity id.
    pub id: i64,
    /// Character name.
    pub name: String,
    /// Region slug.
    pub region: String,
    /// Realm slug.
    pub realm: String,
    /// Blizzard character id, when known.
    pub blizzard_id: Option<i64>,
}

/// A tracked LoL account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LolEntity {
    /// Entity id.
    pub id: i64,
    /// Riot game name.
    pub name: String,
    /// Riot tag line.
    pub tag: String,
    /// Riot PUUID.
    pub puuid: String,
    /// Encrypted summoner id.
    pub summoner_id: String,
    /// Profile icon id.
    pub summoner_icon: i32,
    /// Summoner level.
    pub summoner_level: i64,
}

/// A tracked character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Entity {
    /// WoW retail character.
    Wow(WowEntity),
    /// WoW hardcore character.
    WowHc(WowEntity),
    /// LoL account.
    Lol(LolEntity),
}

impl Entity {
    /// Builds the entity an insert request becomes once it has an id.
    #[must_use]
    pub fn from_insert(id: i64, request: &InsertEntityRequest) -> Self {
        match request {
            InsertEntityRequest::Wow(r) => Self::Wow(WowEntity::from_insert(id, r)),
            InsertEntityRequest::WowHc(r) => Self::WowHc(WowEntity::from_insert(id, r)),
            InsertEntityRequest::Lol(r) => Self::Lol(LolEntity {
                id,
                name: r.name.clone(),
                tag: r.tag.clone(),
                puuid: r.puuid.clone(),
                summoner_id: r.summoner_id.clone(),
                summoner_icon: r.summoner_icon,
                summoner_level: r.summoner_level,
            }),
        }
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::Wow(e) | Self::WowHc(e) => e.id,
            Self::Lol(e) => e.id,
        }
    }

    /// Entity name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Wow(e) | Self::WowHc(e) => &e.name,
            Self::Lol(e) => &e.name,
        }
    }

    /// The game this entity belongs to.
    #[must_use]
    pub fn game(&self) -> Game {
        match self {
            Self::Wow(_) => Game::Wow,
            Self::WowHc(_) => Game::WowHc,
            Self::Lol(_) => Game::Lol,
        }
    }

    /// The external identity entities are unique on.
    #[must_use]
    pub fn external_key(&self) -> String {
        match self {
            Self::Wow(e) | Self::WowHc(e) => wow_key(&e.region, &e.realm, &e.name),
            Self::Lol(e) => e.puuid.clone(),
        }
    }

    /// Whether this entity is the one `request` asks for.
    #[must_use]
    pub fn matches(&self, request: &CreateEntityRequest) -> bool {
        match (self, request) {
            (Self::Wow(e), CreateEntityRequest::Wow(r))
            | (Self::WowHc(e), CreateEntityRequest::WowHc(r)) => {
                wow_key(&e.region, &e.realm, &e.name) == wow_key(&r.region, &r.realm, &r.name)
            }
            (Self::Lol(e), CreateEntityRequest::Lol(r)) => {
                e.name.eq_ignore_ascii_case(&r.name) && e.tag.eq_ignore_ascii_case(&r.tag)
            }
            _ => false,
        }
    }
}

impl WowEntity {
    fn from_insert(id: i64, request: &WowInsertRequest) -> Self {
        Self {
            id,
            name: request.name.clone(),
            region: request.region.clone(),
            realm: request.realm.clone(),
            blizzard_id: request.blizzard_id,
        }
    }
}

/// Game-specific options passed alongside entity requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraArguments {
    /// The single request names a guild whose roster should be tracked.
    #[serde(default)]
    pub is_guild: bool,
}

/// A WoW guild backing a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildPayload {
    /// Guild name.
    pub name: String,
    /// Realm slug.
    pub realm: String,
    /// Region slug.
    pub region: String,
    /// Blizzard guild id.
    pub blizzard_id: i64,
}

/// A request a resolver rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRequest {
    /// The rejected request.
    pub request: CreateEntityRequest,
    /// Why it was rejected.
    pub reason: String,
}

/// Outcome of resolving a batch of entity requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEntities {
    /// New entities to insert, with their aliases.
    pub entities: Vec<(InsertEntityRequest, Option<String>)>,
    /// Entities already tracked, with their aliases.
    pub existing: Vec<(Entity, Option<String>)>,
    /// The guild the entities were expanded from.
    pub guild: Option<GuildPayload>,
    /// Requests that failed external validation.
    pub dropped: Vec<DroppedRequest>,
}

/// A time-series snapshot of an entity's synchronized stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCache {
    /// Entity the snapshot belongs to.
    pub entity_id: i64,
    /// Serialized game-specific payload.
    pub data: String,
    /// When the snapshot was taken.
    pub inserted: DateTime<Utc>,
    /// Game of the entity.
    pub game: Game,
}

/// Returns the most recently inserted record of `records`, if any.
#[must_use]
pub fn latest(records: &[DataCache]) -> Option<&DataCache> {
    records.iter().max_by_key(|r| r.inserted)
}
