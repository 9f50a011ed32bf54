//! Repository abstractions.
//!
//! Production implementations live in `leaderview-persistence`; tests use the
//! in-memory arenas from `leaderview-test-support`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::entity::{CreateEntityRequest, DataCache, Entity, Game, GuildPayload, InsertEntityRequest};
use crate::error::{DomainError, InsertError};
use crate::event::{Event, EventWithVersion, Operation};
use crate::subscription::SubscriptionState;
use crate::view::{SimpleView, ViewEntity, ViewPatch};

/// Append-only, globally versioned event log.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends `event`, assigning it the next global version. The append is
    /// durable when this returns.
    async fn save(&self, event: Event) -> Result<Operation, DomainError>;

    /// Returns every event with `version > from_version_exclusive`, in
    /// ascending version order. Repeated calls return the same events.
    async fn get_events(
        &self,
        from_version_exclusive: i64,
    ) -> Result<Vec<EventWithVersion>, DomainError>;
}

/// Durable map from subscription name to its checkpoint.
#[async_trait]
pub trait SubscriptionStateRepository: Send + Sync {
    /// Loads the state of `name`, if registered.
    async fn get(&self, name: &str) -> Result<Option<SubscriptionState>, DomainError>;

    /// Creates or replaces the state of `name`.
    async fn save(&self, name: &str, state: &SubscriptionState) -> Result<(), DomainError>;
}

/// Tracked entities.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Finds the entity `request` refers to.
    async fn get(&self, request: &CreateEntityRequest) -> Result<Option<Entity>, DomainError>;

    /// Finds the entity of `game` whose external identity is `key`.
    async fn get_by_external_key(
        &self,
        game: Game,
        key: &str,
    ) -> Result<Option<Entity>, DomainError>;

    /// Loads the entities of `game` with the given ids; unknown ids are skipped.
    async fn get_by_ids(&self, ids: &[i64], game: Game) -> Result<Vec<Entity>, DomainError>;

    /// Loads every entity of `game`.
    async fn get_all(&self, game: Game) -> Result<Vec<Entity>, DomainError>;

    /// Inserts all `requests` or none of them.
    async fn insert(&self, requests: &[InsertEntityRequest]) -> Result<Vec<Entity>, InsertError>;

    /// Replaces the game-specific fields of entity `id`.
    async fn update(&self, id: i64, request: &InsertEntityRequest) -> Result<(), DomainError>;
}

/// Materialized views and their memberships.
#[async_trait]
pub trait ViewsRepository: Send + Sync {
    /// Loads a view.
    async fn get(&self, id: &str) -> Result<Option<SimpleView>, DomainError>;

    /// Stores a new view (its entity list is ignored; see
    /// [`ViewsRepository::associate_entities_to_view`]).
    async fn create(&self, view: &SimpleView) -> Result<(), DomainError>;

    /// Replaces a view's own fields.
    async fn edit(&self, view: &SimpleView) -> Result<(), DomainError>;

    /// Changes some of a view's own fields.
    async fn patch(&self, id: &str, patch: &ViewPatch) -> Result<(), DomainError>;

    /// Deletes a view. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool, DomainError>;

    /// Replaces the membership of `view_id` with `entities`.
    async fn associate_entities_to_view(
        &self,
        entities: &[ViewEntity],
        view_id: &str,
    ) -> Result<(), DomainError>;

    /// Removes `entity_ids` from the membership of `view_id`.
    async fn remove_entities_from_view(
        &self,
        view_id: &str,
        entity_ids: &[i64],
    ) -> Result<(), DomainError>;

    /// Records that `view_id` tracks the roster of `guild`.
    async fn associate_guild_to_view(
        &self,
        view_id: &str,
        guild: &GuildPayload,
    ) -> Result<(), DomainError>;

    /// Loads every view backed by a guild roster.
    async fn get_guild_views(&self) -> Result<Vec<(SimpleView, GuildPayload)>, DomainError>;
}

/// Time-series store of synchronized snapshots.
#[async_trait]
pub trait DataCacheRepository: Send + Sync {
    /// Appends `records`. Returns whether anything was written.
    async fn insert(&self, records: &[DataCache]) -> Result<bool, DomainError>;

    /// Loads every snapshot of `entity_id`.
    async fn get(&self, entity_id: i64) -> Result<Vec<DataCache>, DomainError>;

    /// Deletes snapshots older than `now - ttl`, optionally only for `game`.
    /// With `keep_last`, the newest snapshot of each entity survives.
    /// Returns the number of deleted records.
    async fn delete_expired_records(
        &self,
        ttl: Duration,
        game: Option<Game>,
        keep_last: bool,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError>;
}
