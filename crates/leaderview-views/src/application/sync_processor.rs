//! Per-game synchronization of view members.

use std::sync::Arc;

use async_trait::async_trait;
use leaderview_core::entity::Game;
use leaderview_core::error::DomainError;
use leaderview_core::event::{EventData, EventWithVersion};
use leaderview_core::repository::{EntityRepository, ViewsRepository};
use leaderview_core::synchronizer::SynchronizerBank;
use leaderview_subscriptions::EventProcessor;
use tracing::{debug, info, instrument, warn};

/// Synchronizes the members of a view of one game whenever the view is
/// created, edited, patched or explicitly synchronized.
///
/// Per-entity synchronization errors are logged and never fail the event.
pub struct EntitySyncProcessor {
    game: Game,
    views: Arc<dyn ViewsRepository>,
    entities: Arc<dyn EntityRepository>,
    synchronizers: SynchronizerBank,
}

impl EntitySyncProcessor {
    /// Creates the processor for `game`.
    #[must_use]
    pub fn new(
        game: Game,
        views: Arc<dyn ViewsRepository>,
        entities: Arc<dyn EntityRepository>,
        synchronizers: SynchronizerBank,
    ) -> Self {
        Self {
            game,
            views,
            entities,
            synchronizers,
        }
    }

    async fn view_members(&self, view_id: &str) -> Result<Option<Vec<i64>>, DomainError> {
        Ok(self.views.get(view_id).await?.map(|view| view.entities))
    }

    async fn synchronize(&self, ids: &[i64]) -> Result<(), DomainError> {
        if ids.is_empty() {
            return Ok(());
        }
        let entities = self.entities.get_by_ids(ids, self.game).await?;
        let errors = self
            .synchronizers
            .for_game(self.game)
            .synchronize(&entities)
            .await;
        for err in &errors {
            warn!(game = %self.game, error = %err, "entity synchronization failed");
        }
        info!(
            game = %self.game,
            requested = entities.len(),
            failed = errors.len(),
            "view members synchronized"
        );
        Ok(())
    }
}

#[async_trait]
impl EventProcessor for EntitySyncProcessor {
    #[instrument(skip_all, fields(game = %self.game, version = event.version))]
    async fn process(&self, event: &EventWithVersion) -> Result<(), DomainError> {
        let data = &event.event.event_data;
        if data.game() != self.game {
            return Ok(());
        }

        let ids = match data {
            EventData::ViewCreated(e) => Some(e.entities.clone()),
            EventData::ViewEdited(e) => Some(e.entities.clone()),
            EventData::ViewPatched(e) => match &e.entities {
                Some(ids) => Some(ids.clone()),
                None => self.view_members(&e.id).await?,
            },
            EventData::RequestToBeSynced(e) => self.view_members(&e.view_id).await?,
            EventData::ViewToBeCreated(_)
            | EventData::ViewToBeEdited(_)
            | EventData::ViewToBePatched(_)
            | EventData::ViewDeleted(_) => return Ok(()),
        };

        match ids {
            Some(ids) => self.synchronize(&ids).await,
            None => {
                debug!("view no longer exists, nothing to synchronize");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use leaderview_core::entity::{Entity, InsertEntityRequest, LolInsertRequest};
    use leaderview_core::error::ServiceError;
    use leaderview_core::event::{Event, RequestToBeSynced, ViewCreated, ViewDeleted};
    use leaderview_core::view::SimpleView;
    use leaderview_test_support::{
        InMemoryEntityRepository, InMemoryViewsRepository, RecordingSynchronizer,
    };

    use super::*;

    fn lol_entity(id: i64) -> Entity {
        Entity::from_insert(
            id,
            &InsertEntityRequest::Lol(LolInsertRequest {
                name: format!("player{id}"),
                tag: "EUW".to_owned(),
                puuid: format!("puuid-{id}"),
                summoner_id: format!("s-{id}"),
                summoner_icon: 1,
                summoner_level: 100,
            }),
        )
    }

    fn versioned(event_data: EventData) -> EventWithVersion {
        EventWithVersion {
            version: 1,
            event: Event {
                aggregate_root: "/credentials/alice".to_owned(),
                operation_id: "op".to_owned(),
                event_data,
            },
        }
    }

    fn processor(
        lol: Arc<RecordingSynchronizer>,
        other: Arc<RecordingSynchronizer>,
        views: Vec<SimpleView>,
    ) -> EntitySyncProcessor {
        EntitySyncProcessor::new(
            Game::Lol,
            Arc::new(InMemoryViewsRepository::with_views(views)),
            Arc::new(InMemoryEntityRepository::with_entities(vec![
                lol_entity(1),
                lol_entity(2),
            ])),
            SynchronizerBank::new(other.clone(), other, lol),
        )
    }

    #[tokio::test]
    async fn test_view_created_synchronizes_its_members() {
        // Arrange
        let lol = Arc::new(RecordingSynchronizer::new());
        let other = Arc::new(RecordingSynchronizer::new());
        let processor = processor(lol.clone(), other.clone(), Vec::new());
        let event = versioned(EventData::ViewCreated(ViewCreated {
            id: "v1".to_owned(),
            name: "Friends".to_owned(),
            owner: "alice".to_owned(),
            entities: vec![1, 2, 99],
            published: true,
            game: Game::Lol,
            featured: false,
        }));

        // Act
        processor.process(&event).await.unwrap();

        // Assert
        assert_eq!(lol.calls(), vec![vec![1, 2]], "unknown ids are skipped");
        assert!(other.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sync_request_reads_members_from_the_view() {
        // Arrange
        let lol = Arc::new(RecordingSynchronizer::new());
        let view = SimpleView {
            id: "v1".to_owned(),
            name: "Friends".to_owned(),
            owner: "alice".to_owned(),
            published: true,
            game: Game::Lol,
            featured: false,
            entities: vec![2],
        };
        let processor = processor(lol.clone(), Arc::new(RecordingSynchronizer::new()), vec![view]);
        let event = versioned(EventData::RequestToBeSynced(RequestToBeSynced {
            view_id: "v1".to_owned(),
            game: Game::Lol,
        }));

        // Act
        processor.process(&event).await.unwrap();

        // Assert
        assert_eq!(lol.calls(), vec![vec![2]]);
    }

    #[tokio::test]
    async fn test_events_of_other_games_are_ignored() {
        let lol = Arc::new(RecordingSynchronizer::new());
        let processor = processor(lol.clone(), Arc::new(RecordingSynchronizer::new()), Vec::new());
        let event = versioned(EventData::RequestToBeSynced(RequestToBeSynced {
            view_id: "v1".to_owned(),
            game: Game::Wow,
        }));

        processor.process(&event).await.unwrap();

        assert!(lol.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_and_missing_views_are_a_no_op() {
        let lol = Arc::new(RecordingSynchronizer::new());
        let processor = processor(lol.clone(), Arc::new(RecordingSynchronizer::new()), Vec::new());

        processor
            .process(&versioned(EventData::ViewDeleted(ViewDeleted {
                id: "v1".to_owned(),
                game: Game::Lol,
            })))
            .await
            .unwrap();
        processor
            .process(&versioned(EventData::RequestToBeSynced(RequestToBeSynced {
                view_id: "gone".to_owned(),
                game: Game::Lol,
            })))
            .await
            .unwrap();

        assert!(lol.calls().is_empty());
    }

    #[tokio::test]
    async fn test_entity_errors_do_not_fail_the_event() {
        // Arrange
        let lol = Arc::new(RecordingSynchronizer::with_errors(vec![ServiceError::NotFound(
            "puuid-1".into(),
        )]));
        let processor = processor(lol.clone(), Arc::new(RecordingSynchronizer::new()), Vec::new());
        let event = versioned(EventData::ViewCreated(ViewCreated {
            id: "v1".to_owned(),
            name: "Friends".to_owned(),
            owner: "alice".to_owned(),
            entities: vec![1],
            published: true,
            game: Game::Lol,
            featured: false,
        }));

        // Act
        let result = processor.process(&event).await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(lol.calls().len(), 1);
    }
}
