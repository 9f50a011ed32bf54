//! Command handlers for the views context.
//!
//! Handlers validate a command against the current read model and append
//! the matching intent event. The event processors do the actual work.

use leaderview_core::command::Command;
use leaderview_core::error::{ControllerError, DomainError};
use leaderview_core::event::{
    Event, EventData, Operation, RequestToBeSynced, ViewDeleted, ViewToBeCreated, ViewToBeEdited,
    ViewToBePatched, credentials_root,
};
use leaderview_core::repository::{EventStore, ViewsRepository};
use leaderview_core::view::SimpleView;
use tracing::info;

use crate::domain::commands::{
    CreateView, DeleteView, EditView, PatchView, RequestSync, validate_entities, validate_name,
};

async fn append(
    command: &dyn Command,
    event_data: EventData,
    events: &dyn EventStore,
) -> Result<Operation, DomainError> {
    let operation = events
        .save(Event {
            aggregate_root: credentials_root(command.owner()),
            operation_id: command.operation_id().to_owned(),
            event_data,
        })
        .await?;
    info!(
        command = command.command_type(),
        event_type = %operation.event_type,
        version = operation.version,
        "command accepted"
    );
    Ok(operation)
}

/// Loads a view the caller owns.
async fn owned_view(
    view_id: &str,
    owner: &str,
    views: &dyn ViewsRepository,
) -> Result<SimpleView, DomainError> {
    let view = views
        .get(view_id)
        .await?
        .ok_or_else(|| ControllerError::NotFound(format!("view {view_id}")))?;
    if view.owner != owner {
        return Err(ControllerError::Forbidden(format!("view {view_id} belongs to another user")).into());
    }
    Ok(view)
}

/// Handles the `CreateView` command.
///
/// # Errors
///
/// Returns `DomainError::Controller` if the command is invalid or the view id
/// is taken, or the store's error if appending fails.
pub async fn handle_create_view(
    command: &CreateView,
    views: &dyn ViewsRepository,
    events: &dyn EventStore,
) -> Result<Operation, DomainError> {
    validate_name(&command.name)?;
    validate_entities(
        command.game,
        &command.entities,
        command.extra_arguments.as_ref(),
    )?;
    if views.get(&command.view_id).await?.is_some() {
        return Err(ControllerError::Validation(format!(
            "view {} already exists",
            command.view_id
        ))
        .into());
    }

    let event_data = EventData::ViewToBeCreated(ViewToBeCreated {
        id: command.view_id.clone(),
        name: command.name.clone(),
        published: command.published,
        entities: command.entities.clone(),
        game: command.game,
        owner: command.owner.clone(),
        featured: command.featured,
        extra_arguments: command.extra_arguments.clone(),
    });
    append(command, event_data, events).await
}

/// Handles the `EditView` command.
///
/// # Errors
///
/// Returns `DomainError::Controller` if the command is invalid, the view does
/// not exist or belongs to someone else, or the store's error if appending
/// fails.
pub async fn handle_edit_view(
    command: &EditView,
    views: &dyn ViewsRepository,
    events: &dyn EventStore,
) -> Result<Operation, DomainError> {
    validate_name(&command.name)?;
    let view = owned_view(&command.view_id, &command.owner, views).await?;
    validate_entities(view.game, &command.entities, command.extra_arguments.as_ref())?;

    let event_data = EventData::ViewToBeEdited(ViewToBeEdited {
        id: view.id,
        name: command.name.clone(),
        published: command.published,
        entities: command.entities.clone(),
        game: view.game,
        featured: command.featured,
        extra_arguments: command.extra_arguments.clone(),
    });
    append(command, event_data, events).await
}

/// Handles the `PatchView` command. Absent fields are left unchanged.
///
/// # Errors
///
/// Returns `DomainError::Controller` if the command is invalid, the view does
/// not exist or belongs to someone else, or the store's error if appending
/// fails.
pub async fn handle_patch_view(
    command: &PatchView,
    views: &dyn ViewsRepository,
    events: &dyn EventStore,
) -> Result<Operation, DomainError> {
    if let Some(name) = &command.name {
        validate_name(name)?;
    }
    let view = owned_view(&command.view_id, &command.owner, views).await?;
    if let Some(entities) = &command.entities {
        validate_entities(view.game, entities, command.extra_arguments.as_ref())?;
    }

    let event_data = EventData::ViewToBePatched(ViewToBePatched {
        id: view.id,
        name: command.name.clone(),
        published: command.published,
        entities: command.entities.clone(),
        game: view.game,
        featured: command.featured,
        extra_arguments: command.extra_arguments.clone(),
    });
    append(command, event_data, events).await
}

/// Handles the `DeleteView` command: removes the view and records the
/// deletion.
///
/// # Errors
///
/// Returns `DomainError::Controller` if the view does not exist or belongs to
/// someone else, or the repository's error if deleting or appending fails.
pub async fn handle_delete_view(
    command: &DeleteView,
    views: &dyn ViewsRepository,
    events: &dyn EventStore,
) -> Result<Operation, DomainError> {
    let view = owned_view(&command.view_id, &command.owner, views).await?;
    views.delete(&view.id).await?;

    let event_data = EventData::ViewDeleted(ViewDeleted {
        id: view.id,
        game: view.game,
    });
    append(command, event_data, events).await
}

/// Handles the `RequestSync` command. Published views may be synchronized by
/// anyone; private views only by their owner.
///
/// # Errors
///
/// Returns `DomainError::Controller` if the view does not exist or is private
/// to someone else, or the store's error if appending fails.
pub async fn handle_request_sync(
    command: &RequestSync,
    views: &dyn ViewsRepository,
    events: &dyn EventStore,
) -> Result<Operation, DomainError> {
    let view = views
        .get(&command.view_id)
        .await?
        .ok_or_else(|| ControllerError::NotFound(format!("view {}", command.view_id)))?;
    if !view.published && view.owner != command.owner {
        return Err(ControllerError::Forbidden(format!(
            "view {} is private",
            command.view_id
        ))
        .into());
    }

    let event_data = EventData::RequestToBeSynced(RequestToBeSynced {
        view_id: view.id,
        game: view.game,
    });
    append(command, event_data, events).await
}

#[cfg(test)]
mod tests {
    use leaderview_core::entity::{CreateEntityRequest, ExtraArguments, Game, LolEntityRequest};
    use leaderview_core::error::{ControllerError, DomainError};
    use leaderview_core::event::EventData;
    use leaderview_core::repository::ViewsRepository;
    use leaderview_core::view::SimpleView;
    use leaderview_test_support::{FailingEventStore, InMemoryEventStore, InMemoryViewsRepository};

    use super::*;

    fn caps() -> CreateEntityRequest {
        CreateEntityRequest::Lol(LolEntityRequest {
            name: "Caps".to_owned(),
            tag: "EUW".to_owned(),
            alias: Some("the goat".to_owned()),
        })
    }

    fn create_command() -> CreateView {
        CreateView {
            operation_id: "op-1".to_owned(),
            owner: "alice".to_owned(),
            view_id: "v1".to_owned(),
            name: "Friends".to_owned(),
            published: true,
            entities: vec![caps()],
            game: Game::Lol,
            featured: false,
            extra_arguments: None,
        }
    }

    fn stored_view(owner: &str, published: bool) -> SimpleView {
        SimpleView {
            id: "v1".to_owned(),
            name: "Friends".to_owned(),
            owner: owner.to_owned(),
            published,
            game: Game::Lol,
            featured: false,
            entities: vec![1],
        }
    }

    #[tokio::test]
    async fn test_handle_create_view_appends_intent_under_owner_root() {
        // Arrange
        let views = InMemoryViewsRepository::new();
        let events = InMemoryEventStore::new();

        // Act
        let operation = handle_create_view(&create_command(), &views, &events)
            .await
            .unwrap();

        // Assert
        assert_eq!(operation.id, "op-1");
        assert_eq!(operation.aggregate_root, "/credentials/alice");
        assert_eq!(operation.event_type, "ViewToBeCreated");
        assert_eq!(operation.version, 1);
        let log = events.events();
        match &log[0].event.event_data {
            EventData::ViewToBeCreated(e) => {
                assert_eq!(e.id, "v1");
                assert_eq!(e.owner, "alice");
                assert_eq!(e.entities, vec![caps()]);
            }
            other => panic!("expected ViewToBeCreated, got {other:?}"),
        }
        assert!(views.get("v1").await.unwrap().is_none(), "processor creates the view");
    }

    #[tokio::test]
    async fn test_handle_create_view_rejects_blank_name() {
        // Arrange
        let views = InMemoryViewsRepository::new();
        let events = InMemoryEventStore::new();
        let mut command = create_command();
        command.name = "   ".to_owned();

        // Act
        let result = handle_create_view(&command, &views, &events).await;

        // Assert
        match result.unwrap_err() {
            DomainError::Controller(ControllerError::Validation(msg)) => {
                assert_eq!(msg, "view name must not be empty");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn test_handle_create_view_rejects_guild_view_for_other_games() {
        let views = InMemoryViewsRepository::new();
        let events = InMemoryEventStore::new();
        let mut command = create_command();
        command.extra_arguments = Some(ExtraArguments { is_guild: true });

        let result = handle_create_view(&command, &views, &events).await;

        assert!(matches!(
            result,
            Err(DomainError::Controller(ControllerError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_handle_create_view_propagates_store_failure() {
        let views = InMemoryViewsRepository::new();

        let result = handle_create_view(&create_command(), &views, &FailingEventStore).await;

        match result.unwrap_err() {
            DomainError::Infrastructure(msg) => assert_eq!(msg, "connection refused"),
            other => panic!("expected Infrastructure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_edit_view_requires_ownership() {
        // Arrange
        let views = InMemoryViewsRepository::with_views(vec![stored_view("bob", true)]);
        let events = InMemoryEventStore::new();
        let command = EditView {
            operation_id: "op-2".to_owned(),
            owner: "alice".to_owned(),
            view_id: "v1".to_owned(),
            name: "Mine now".to_owned(),
            published: false,
            entities: vec![caps()],
            featured: false,
            extra_arguments: None,
        };

        // Act
        let result = handle_edit_view(&command, &views, &events).await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::Controller(ControllerError::Forbidden(_)))
        ));
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn test_handle_patch_view_takes_game_from_stored_view() {
        // Arrange
        let views = InMemoryViewsRepository::with_views(vec![stored_view("alice", true)]);
        let events = InMemoryEventStore::new();
        let command = PatchView {
            operation_id: "op-3".to_owned(),
            owner: "alice".to_owned(),
            view_id: "v1".to_owned(),
            name: None,
            published: Some(false),
            entities: None,
            featured: None,
            extra_arguments: None,
        };

        // Act
        handle_patch_view(&command, &views, &events).await.unwrap();

        // Assert
        match &events.events()[0].event.event_data {
            EventData::ViewToBePatched(e) => {
                assert_eq!(e.game, Game::Lol);
                assert_eq!(e.published, Some(false));
                assert_eq!(e.entities, None);
            }
            other => panic!("expected ViewToBePatched, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_patch_view_of_missing_view_is_not_found() {
        let views = InMemoryViewsRepository::new();
        let events = InMemoryEventStore::new();
        let command = PatchView {
            operation_id: "op-3".to_owned(),
            owner: "alice".to_owned(),
            view_id: "ghost".to_owned(),
            name: Some("x".to_owned()),
            published: None,
            entities: None,
            featured: None,
            extra_arguments: None,
        };

        let result = handle_patch_view(&command, &views, &events).await;

        assert!(matches!(
            result,
            Err(DomainError::Controller(ControllerError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_handle_delete_view_removes_view_and_records_deletion() {
        // Arrange
        let views = InMemoryViewsRepository::with_views(vec![stored_view("alice", true)]);
        let events = InMemoryEventStore::new();
        let command = DeleteView {
            operation_id: "op-4".to_owned(),
            owner: "alice".to_owned(),
            view_id: "v1".to_owned(),
        };

        // Act
        let operation = handle_delete_view(&command, &views, &events).await.unwrap();

        // Assert
        assert_eq!(operation.event_type, "ViewDeleted");
        assert!(views.get("v1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_handle_request_sync_allows_anyone_on_published_views() {
        // Arrange
        let views = InMemoryViewsRepository::with_views(vec![stored_view("bob", true)]);
        let events = InMemoryEventStore::new();
        let command = RequestSync {
            operation_id: "op-5".to_owned(),
            owner: "alice".to_owned(),
            view_id: "v1".to_owned(),
        };

        // Act
        let operation = handle_request_sync(&command, &views, &events).await.unwrap();

        // Assert
        assert_eq!(operation.event_type, "RequestToBeSynced");
        assert_eq!(operation.aggregate_root, "/credentials/alice");
    }

    #[tokio::test]
    async fn test_handle_request_sync_forbids_private_views_of_others() {
        let views = InMemoryViewsRepository::with_views(vec![stored_view("bob", false)]);
        let events = InMemoryEventStore::new();
        let command = RequestSync {
            operation_id: "op-6".to_owned(),
            owner: "alice".to_owned(),
            view_id: "v1".to_owned(),
        };

        let result = handle_request_sync(&command, &views, &events).await;

        assert!(matches!(
            result,
            Err(DomainError::Controller(ControllerError::Forbidden(_)))
        ));
    }
}
