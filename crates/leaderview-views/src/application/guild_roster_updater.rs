//! Keeps guild views in line with their guild rosters.

use std::collections::HashSet;
use std::sync::Arc;

use leaderview_core::entity::{CreateEntityRequest, ExtraArguments, GuildPayload, WowEntityRequest};
use leaderview_core::error::DomainError;
use leaderview_core::repository::{DataCacheRepository, ViewsRepository};
use leaderview_core::resolver::ResolverBank;
use leaderview_core::view::{SimpleView, ViewEntity};
use tracing::{info, instrument, warn};

use crate::application::entity_materializer::EntityMaterializer;

/// Re-reads the roster of every guild view, adds new members and drops
/// former members that were never synchronized. Former members with cached
/// stats stay in the view.
pub struct GuildRosterUpdater {
    resolvers: ResolverBank,
    materializer: EntityMaterializer,
    views: Arc<dyn ViewsRepository>,
    cache: Arc<dyn DataCacheRepository>,
}

impl GuildRosterUpdater {
    /// Creates a new `GuildRosterUpdater`.
    #[must_use]
    pub fn new(
        resolvers: ResolverBank,
        materializer: EntityMaterializer,
        views: Arc<dyn ViewsRepository>,
        cache: Arc<dyn DataCacheRepository>,
    ) -> Self {
        Self {
            resolvers,
            materializer,
            views,
            cache,
        }
    }

    /// Updates every guild view.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the guild views cannot be listed. A view that
    /// fails to update is logged and its error returned in the `Ok` value.
    #[instrument(skip_all)]
    pub async fn update_all(&self) -> Result<Vec<DomainError>, DomainError> {
        let guild_views = self.views.get_guild_views().await?;
        let total = guild_views.len();

        let mut errors = Vec::new();
        for (view, guild) in guild_views {
            if let Err(err) = self.update_view(&view, &guild).await {
                warn!(view_id = %view.id, guild = %guild.name, error = %err, "guild roster update failed");
                errors.push(err);
            }
        }
        info!(views = total, failed = errors.len(), "guild rosters updated");
        Ok(errors)
    }

    async fn update_view(&self, view: &SimpleView, guild: &GuildPayload) -> Result<(), DomainError> {
        let request = CreateEntityRequest::WowHc(WowEntityRequest {
            name: guild.name.clone(),
            region: guild.region.clone(),
            realm: guild.realm.clone(),
            alias: None,
        });
        let resolved = self
            .resolvers
            .resolve(view.game, vec![request], Some(&ExtraArguments { is_guild: true }))
            .await?;
        let refreshed = resolved.guild.clone();

        let mut members = self.materializer.materialize(resolved).await?;
        let on_roster: HashSet<i64> = members.iter().map(|m| m.entity_id).collect();

        let mut removed = Vec::new();
        for &entity_id in &view.entities {
            if on_roster.contains(&entity_id) {
                continue;
            }
            if self.cache.get(entity_id).await?.is_empty() {
                removed.push(entity_id);
            } else {
                members.push(ViewEntity {
                    entity_id,
                    alias: None,
                });
            }
        }

        self.views.associate_entities_to_view(&members, &view.id).await?;
        if let Some(refreshed) = refreshed.filter(|g| g != guild) {
            self.views.associate_guild_to_view(&view.id, &refreshed).await?;
        }

        info!(
            view_id = %view.id,
            members = members.len(),
            removed = ?removed,
            "guild view updated"
        );
        Ok(())
    }
}
