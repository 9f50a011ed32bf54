//! `PostgreSQL` implementation of the `ViewsRepository` trait.

use async_trait::async_trait;
use leaderview_core::entity::GuildPayload;
use leaderview_core::error::DomainError;
use leaderview_core::repository::ViewsRepository;
use leaderview_core::view::{SimpleView, ViewEntity, ViewPatch};
use sqlx::PgPool;

use crate::schema::{infrastructure, parse_game};

const SELECT_VIEW: &str = r"
    SELECT v.id, v.name, v.owner, v.published, v.game, v.featured,
           COALESCE(
               (SELECT array_agg(ve.entity_id ORDER BY ve.position)
                FROM view_entities ve WHERE ve.view_id = v.id),
               '{}'
           ) AS entities
    FROM views v
";

#[derive(sqlx::FromRow)]
struct ViewRow {
    id: String,
    name: String,
    owner: String,
    published: bool,
    game: String,
    featured: bool,
    entities: Vec<i64>,
}

impl ViewRow {
    fn into_view(self) -> Result<SimpleView, DomainError> {
        Ok(SimpleView {
            id: self.id,
            name: self.name,
            owner: self.owner,
            published: self.published,
            game: parse_game(&self.game)?,
            featured: self.featured,
            entities: self.entities,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GuildRow {
    view_id: String,
    name: String,
    realm: String,
    region: String,
    blizzard_id: i64,
}

/// PostgreSQL-backed views repository.
#[derive(Debug, Clone)]
pub struct PgViewsRepository {
    pool: PgPool,
}

impl PgViewsRepository {
    /// Creates a new `PgViewsRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn missing(id: &str) -> DomainError {
    DomainError::Infrastructure(format!("view {id} not found"))
}

#[async_trait]
impl ViewsRepository for PgViewsRepository {
    async fn get(&self, id: &str) -> Result<Option<SimpleView>, DomainError> {
        let row = sqlx::query_as::<_, ViewRow>(&format!("{SELECT_VIEW} WHERE v.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?;

        row.map(ViewRow::into_view).transpose()
    }

    async fn create(&self, view: &SimpleView) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO views (id, name, owner, published, game, featured)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&view.id)
        .bind(&view.name)
        .bind(&view.owner)
        .bind(view.published)
        .bind(view.game.as_str())
        .bind(view.featured)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(())
    }

    async fn edit(&self, view: &SimpleView) -> Result<(), DomainError> {
        let result =
            sqlx::query("UPDATE views SET name = $2, published = $3, featured = $4 WHERE id = $1")
                .bind(&view.id)
                .bind(&view.name)
                .bind(view.published)
                .bind(view.featured)
                .execute(&self.pool)
                .await
                .map_err(infrastructure)?;

        if result.rows_affected() == 0 {
            return Err(missing(&view.id));
        }
        Ok(())
    }

    async fn patch(&self, id: &str, patch: &ViewPatch) -> Result<(), DomainError> {
        let result = sqlx::query(
            r"
            UPDATE views
            SET name = COALESCE($2, name),
                published = COALESCE($3, published),
                featured = COALESCE($4, featured)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&patch.name)
        .bind(patch.published)
        .bind(patch.featured)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;

        if result.rows_affected() == 0 {
            return Err(missing(id));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM views WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(result.rows_affected() > 0)
    }

    async fn associate_entities_to_view(
        &self,
        entities: &[ViewEntity],
        view_id: &str,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        sqlx::query("DELETE FROM view_entities WHERE view_id = $1")
            .bind(view_id)
            .execute(&mut *tx)
            .await
            .map_err(infrastructure)?;

        for (position, entity) in (0_i32..).zip(entities) {
            sqlx::query(
                r"
                INSERT INTO view_entities (view_id, entity_id, alias, position)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(view_id)
            .bind(entity.entity_id)
            .bind(&entity.alias)
            .bind(position)
            .execute(&mut *tx)
            .await
            .map_err(infrastructure)?;
        }

        tx.commit().await.map_err(infrastructure)
    }

    async fn remove_entities_from_view(
        &self,
        view_id: &str,
        entity_ids: &[i64],
    ) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM view_entities WHERE view_id = $1 AND entity_id = ANY($2)")
            .bind(view_id)
            .bind(entity_ids)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(())
    }

    async fn associate_guild_to_view(
        &self,
        view_id: &str,
        guild: &GuildPayload,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO view_guilds (view_id, name, realm, region, blizzard_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (view_id) DO UPDATE
            SET name = EXCLUDED.name,
                realm = EXCLUDED.realm,
                region = EXCLUDED.region,
                blizzard_id = EXCLUDED.blizzard_id
            ",
        )
        .bind(view_id)
        .bind(&guild.name)
        .bind(&guild.realm)
        .bind(&guild.region)
        .bind(guild.blizzard_id)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(())
    }

    async fn get_guild_views(&self) -> Result<Vec<(SimpleView, GuildPayload)>, DomainError> {
        let guilds = sqlx::query_as::<_, GuildRow>(
            "SELECT view_id, name, realm, region, blizzard_id FROM view_guilds ORDER BY view_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        let mut views = Vec::with_capacity(guilds.len());
        for guild in guilds {
            let Some(view) = self.get(&guild.view_id).await? else {
                continue;
            };
            views.push((
                view,
                GuildPayload {
                    name: guild.name,
                    realm: guild.realm,
                    region: guild.region,
                    blizzard_id: guild.blizzard_id,
                },
            ));
        }
        Ok(views)
    }
}
