//! Materializes views from their intent events.

use std::sync::Arc;

use async_trait::async_trait;
use leaderview_core::entity::{CreateEntityRequest, ExtraArguments, Game, GuildPayload};
use leaderview_core::error::DomainError;
use leaderview_core::event::{
    Event, EventData, EventWithVersion, ViewCreated, ViewEdited, ViewPatched, ViewToBeCreated,
    ViewToBeEdited, ViewToBePatched,
};
use leaderview_core::repository::{EventStore, ViewsRepository};
use leaderview_core::resolver::ResolverBank;
use leaderview_core::view::{SimpleView, ViewEntity, ViewPatch};
use leaderview_subscriptions::EventProcessor;
use tracing::{info, instrument, warn};

use crate::application::entity_materializer::EntityMaterializer;

/// Handles `ViewToBeCreated`, `ViewToBeEdited` and `ViewToBePatched`.
///
/// Each handler resolves the requested entities, writes the view and its
/// memberships, then appends the completion event. A failure at any step
/// returns before the completion event, so the intent is processed again.
pub struct ViewProcessor {
    resolvers: ResolverBank,
    materializer: EntityMaterializer,
    views: Arc<dyn ViewsRepository>,
    events: Arc<dyn EventStore>,
}

impl ViewProcessor {
    /// Creates a processor.
    #[must_use]
    pub fn new(
        resolvers: ResolverBank,
        materializer: EntityMaterializer,
        views: Arc<dyn ViewsRepository>,
        events: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            resolvers,
            materializer,
            views,
            events,
        }
    }

    /// Resolves and materializes `requested`, returning memberships and the
    /// guild the members came from.
    async fn members(
        &self,
        game: Game,
        requested: &[CreateEntityRequest],
        extra: Option<&ExtraArguments>,
    ) -> Result<(Vec<ViewEntity>, Option<GuildPayload>), DomainError> {
        let resolved = self
            .resolvers
            .resolve(game, requested.to_vec(), extra)
            .await?;
        for dropped in &resolved.dropped {
            warn!(request = %dropped.request.describe(), reason = %dropped.reason, "entity request dropped");
        }
        let guild = resolved.guild.clone();
        let members = self.materializer.materialize(resolved).await?;
        Ok((members, guild))
    }

    async fn associate(
        &self,
        view_id: &str,
        members: &[ViewEntity],
        guild: Option<&GuildPayload>,
    ) -> Result<(), DomainError> {
        self.views.associate_entities_to_view(members, view_id).await?;
        if let Some(guild) = guild {
            self.views.associate_guild_to_view(view_id, guild).await?;
        }
        Ok(())
    }

    async fn create(&self, event: &Event, intent: &ViewToBeCreated) -> Result<(), DomainError> {
        let (members, guild) = self
            .members(intent.game, &intent.entities, intent.extra_arguments.as_ref())
            .await?;
        let ids: Vec<i64> = members.iter().map(|m| m.entity_id).collect();
        let view = SimpleView {
            id: intent.id.clone(),
            name: intent.name.clone(),
            owner: intent.owner.clone(),
            published: intent.published,
            game: intent.game,
            featured: intent.featured,
            entities: ids.clone(),
        };

        if self.views.get(&view.id).await?.is_some() {
            info!(view_id = %view.id, "view already materialized, refreshing");
            self.views.edit(&view).await?;
        } else {
            self.views.create(&view).await?;
        }
        self.associate(&view.id, &members, guild.as_ref()).await?;

        self.events
            .save(event.completion(EventData::ViewCreated(ViewCreated {
                id: view.id,
                name: view.name,
                owner: view.owner,
                entities: ids,
                published: view.published,
                game: view.game,
                featured: view.featured,
            })))
            .await?;
        Ok(())
    }

    async fn edit(&self, event: &Event, intent: &ViewToBeEdited) -> Result<(), DomainError> {
        let Some(stored) = self.views.get(&intent.id).await? else {
            warn!(view_id = %intent.id, "view deleted before edit was processed, skipping");
            return Ok(());
        };

        let (members, guild) = self
            .members(intent.game, &intent.entities, intent.extra_arguments.as_ref())
            .await?;
        let ids: Vec<i64> = members.iter().map(|m| m.entity_id).collect();
        let view = SimpleView {
            name: intent.name.clone(),
            published: intent.published,
            featured: intent.featured,
            entities: ids.clone(),
            ..stored
        };

        self.views.edit(&view).await?;
        self.associate(&view.id, &members, guild.as_ref()).await?;

        self.events
            .save(event.completion(EventData::ViewEdited(ViewEdited {
                id: view.id,
                name: view.name,
                published: view.published,
                entities: ids,
                game: view.game,
                featured: view.featured,
            })))
            .await?;
        Ok(())
    }

    async fn patch(&self, event: &Event, intent: &ViewToBePatched) -> Result<(), DomainError> {
        if self.views.get(&intent.id).await?.is_none() {
            warn!(view_id = %intent.id, "view deleted before patch was processed, skipping");
            return Ok(());
        }

        let ids = match &intent.entities {
            Some(requested) => {
                let (members, guild) = self
                    .members(intent.game, requested, intent.extra_arguments.as_ref())
                    .await?;
                self.associate(&intent.id, &members, guild.as_ref()).await?;
                Some(members.iter().map(|m| m.entity_id).collect::<Vec<_>>())
            }
            None => None,
        };

        let patch = ViewPatch {
            name: intent.name.clone(),
            published: intent.published,
            featured: intent.featured,
        };
        self.views.patch(&intent.id, &patch).await?;

        self.events
            .save(event.completion(EventData::ViewPatched(ViewPatched {
                id: intent.id.clone(),
                name: patch.name,
                published: patch.published,
                entities: ids,
                game: intent.game,
                featured: patch.featured,
            })))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventProcessor for ViewProcessor {
    #[instrument(skip_all, fields(version = event.version, event_type = event.event.event_data.event_type()))]
    async fn process(&self, event: &EventWithVersion) -> Result<(), DomainError> {
        match &event.event.event_data {
            EventData::ViewToBeCreated(intent) => self.create(&event.event, intent).await,
            EventData::ViewToBeEdited(intent) => self.edit(&event.event, intent).await,
            EventData::ViewToBePatched(intent) => self.patch(&event.event, intent).await,
            EventData::ViewCreated(_)
            | EventData::ViewEdited(_)
            | EventData::ViewPatched(_)
            | EventData::ViewDeleted(_)
            | EventData::RequestToBeSynced(_) => Ok(()),
        }
    }
}
