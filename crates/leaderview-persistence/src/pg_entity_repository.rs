//! `PostgreSQL` implementation of the `EntityRepository` trait.
//!
//! Game-specific fields are stored as the JSON of the insert request the
//! entity was created from. Two derived keys are kept alongside:
//! `external_key` carries the uniqueness constraint and `lookup_key` answers
//! lookups by user-facing request.

use async_trait::async_trait;
use leaderview_core::entity::{CreateEntityRequest, Entity, Game, InsertEntityRequest, wow_key};
use leaderview_core::error::{DomainError, InsertError};
use leaderview_core::repository::EntityRepository;
use sqlx::PgPool;
use tracing::debug;

use crate::schema::{infrastructure, parse_game};

#[derive(sqlx::FromRow)]
struct EntityRow {
    id: i64,
    game: String,
    payload: serde_json::Value,
}

impl EntityRow {
    fn into_entity(self) -> Result<Entity, DomainError> {
        let request: InsertEntityRequest = serde_json::from_value(self.payload)?;
        let game = parse_game(&self.game)?;
        if request.game() != game {
            return Err(DomainError::Infrastructure(format!(
                "entity {} stored as {game} holds a {} payload",
                self.id,
                request.game()
            )));
        }
        Ok(Entity::from_insert(self.id, &request))
    }
}

fn lol_lookup(name: &str, tag: &str) -> String {
    format!("{}#{}", name.to_lowercase(), tag.to_lowercase())
}

fn request_lookup(request: &CreateEntityRequest) -> String {
    match request {
        CreateEntityRequest::Wow(r) | CreateEntityRequest::WowHc(r) => {
            wow_key(&r.region, &r.realm, &r.name)
        }
        CreateEntityRequest::Lol(r) => lol_lookup(&r.name, &r.tag),
    }
}

fn insert_lookup(request: &InsertEntityRequest) -> String {
    match request {
        InsertEntityRequest::Wow(r) | InsertEntityRequest::WowHc(r) => {
            wow_key(&r.region, &r.realm, &r.name)
        }
        InsertEntityRequest::Lol(r) => lol_lookup(&r.name, &r.tag),
    }
}

fn storage(err: impl std::fmt::Display) -> InsertError {
    InsertError::Storage(err.to_string())
}

fn insert_name(request: &InsertEntityRequest) -> &str {
    match request {
        InsertEntityRequest::Wow(r) | InsertEntityRequest::WowHc(r) => &r.name,
        InsertEntityRequest::Lol(r) => &r.name,
    }
}

/// PostgreSQL-backed entity repository.
#[derive(Debug, Clone)]
pub struct PgEntityRepository {
    pool: PgPool,
}

impl PgEntityRepository {
    /// Creates a new `PgEntityRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityRepository for PgEntityRepository {
    async fn get(&self, request: &CreateEntityRequest) -> Result<Option<Entity>, DomainError> {
        let row = sqlx::query_as::<_, EntityRow>(
            "SELECT id, game, payload FROM entities WHERE game = $1 AND lookup_key = $2 LIMIT 1",
        )
        .bind(request.game().as_str())
        .bind(request_lookup(request))
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;

        row.map(EntityRow::into_entity).transpose()
    }

    async fn get_by_external_key(
        &self,
        game: Game,
        key: &str,
    ) -> Result<Option<Entity>, DomainError> {
        let row = sqlx::query_as::<_, EntityRow>(
            "SELECT id, game, payload FROM entities WHERE game = $1 AND external_key = $2",
        )
        .bind(game.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;

        row.map(EntityRow::into_entity).transpose()
    }

    async fn get_by_ids(&self, ids: &[i64], game: Game) -> Result<Vec<Entity>, DomainError> {
        let rows = sqlx::query_as::<_, EntityRow>(
            "SELECT id, game, payload FROM entities WHERE id = ANY($1) AND game = $2 ORDER BY id",
        )
        .bind(ids)
        .bind(game.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.into_iter().map(EntityRow::into_entity).collect()
    }

    async fn get_all(&self, game: Game) -> Result<Vec<Entity>, DomainError> {
        let rows = sqlx::query_as::<_, EntityRow>(
            "SELECT id, game, payload FROM entities WHERE game = $1 ORDER BY id",
        )
        .bind(game.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.into_iter().map(EntityRow::into_entity).collect()
    }

    async fn insert(&self, requests: &[InsertEntityRequest]) -> Result<Vec<Entity>, InsertError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let mut inserted = Vec::with_capacity(requests.len());

        for request in requests {
            let key = request.external_key();
            let payload = serde_json::to_value(request).map_err(storage)?;
            let result = sqlx::query_as::<_, (i64,)>(
                r"
                INSERT INTO entities (game, external_key, lookup_key, name, payload)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                ",
            )
            .bind(request.game().as_str())
            .bind(&key)
            .bind(insert_lookup(request))
            .bind(insert_name(request))
            .bind(&payload)
            .fetch_one(&mut *tx)
            .await;

            match result {
                Ok((id,)) => inserted.push(Entity::from_insert(id, request)),
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    debug!(game = %request.game(), key = %key, "entity already exists");
                    return Err(InsertError::AlreadyExists(key));
                }
                Err(err) => return Err(storage(err)),
            }
        }

        tx.commit().await.map_err(storage)?;
        Ok(inserted)
    }

    async fn update(&self, id: i64, request: &InsertEntityRequest) -> Result<(), DomainError> {
        let payload = serde_json::to_value(request)?;
        let result = sqlx::query(
            r"
            UPDATE entities
            SET external_key = $2, lookup_key = $3, name = $4, payload = $5
            WHERE id = $1 AND game = $6
            ",
        )
        .bind(id)
        .bind(request.external_key())
        .bind(insert_lookup(request))
        .bind(insert_name(request))
        .bind(&payload)
        .bind(request.game().as_str())
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::Infrastructure(format!("entity {id} not found")));
        }
        Ok(())
    }
}
