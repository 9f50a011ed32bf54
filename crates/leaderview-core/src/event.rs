//! Domain events.
//!
//! Every write-side intent is recorded as a "to-be" event; the processor
//! that fulfils it appends the matching completion event under the same
//! aggregate root and operation id.

use serde::{Deserialize, Serialize};

use crate::entity::{CreateEntityRequest, ExtraArguments, Game};

/// Intent to create a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewToBeCreated {
    /// View id.
    pub id: String,
    /// View name.
    pub name: String,
    /// Whether the view is publicly listed.
    pub published: bool,
    /// Requested member entities.
    pub entities: Vec<CreateEntityRequest>,
    /// Game of the view.
    pub game: Game,
    /// Owner of the view.
    pub owner: String,
    /// Whether the view is featured.
    pub featured: bool,
    /// Game-specific resolution options.
    #[serde(default)]
    pub extra_arguments: Option<ExtraArguments>,
}

/// Intent to replace a view's definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewToBeEdited {
    /// View id.
    pub id: String,
    /// View name.
    pub name: String,
    /// Whether the view is publicly listed.
    pub published: bool,
    /// Requested member entities.
    pub entities: Vec<CreateEntityRequest>,
    /// Game of the view.
    pub game: Game,
    /// Whether the view is featured.
    pub featured: bool,
    /// Game-specific resolution options.
    #[serde(default)]
    pub extra_arguments: Option<ExtraArguments>,
}

/// Intent to change some fields of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewToBePatched {
    /// View id.
    pub id: String,
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New published flag.
    #[serde(default)]
    pub published: Option<bool>,
    /// New member entities.
    #[serde(default)]
    pub entities: Option<Vec<CreateEntityRequest>>,
    /// Game of the view.
    pub game: Game,
    /// New featured flag.
    #[serde(default)]
    pub featured: Option<bool>,
    /// Game-specific resolution options.
    #[serde(default)]
    pub extra_arguments: Option<ExtraArguments>,
}

/// A view was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewCreated {
    /// View id.
    pub id: String,
    /// View name.
    pub name: String,
    /// Owner of the view.
    pub owner: String,
    /// Member entity ids.
    pub entities: Vec<i64>,
    /// Whether the view is publicly listed.
    pub published: bool,
    /// Game of the view.
    pub game: Game,
    /// Whether the view is featured.
    pub featured: bool,
}

/// A view was edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewEdited {
    /// View id.
    pub id: String,
    /// View name.
    pub name: String,
    /// Whether the view is publicly listed.
    pub published: bool,
    /// Member entity ids.
    pub entities: Vec<i64>,
    /// Game of the view.
    pub game: Game,
    /// Whether the view is featured.
    pub featured: bool,
}

/// A view was patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPatched {
    /// View id.
    pub id: String,
    /// New name, if changed.
    #[serde(default)]
    pub name: Option<String>,
    /// New published flag, if changed.
    #[serde(default)]
    pub published: Option<bool>,
    /// New member entity ids, if changed.
    #[serde(default)]
    pub entities: Option<Vec<i64>>,
    /// Game of the view.
    pub game: Game,
    /// New featured flag, if changed.
    #[serde(default)]
    pub featured: Option<bool>,
}

/// A view was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDeleted {
    /// View id.
    pub id: String,
    /// Game of the view.
    pub game: Game,
}

/// A user asked for a view's entities to be synchronized now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestToBeSynced {
    /// View id.
    pub view_id: String,
    /// Game of the view.
    pub game: Game,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum EventData {
    /// A view should be created.
    ViewToBeCreated(ViewToBeCreated),
    /// A view should be edited.
    ViewToBeEdited(ViewToBeEdited),
    /// A view should be patched.
    ViewToBePatched(ViewToBePatched),
    /// A view has been created.
    ViewCreated(ViewCreated),
    /// A view has been edited.
    ViewEdited(ViewEdited),
    /// A view has been patched.
    ViewPatched(ViewPatched),
    /// A view has been deleted.
    ViewDeleted(ViewDeleted),
    /// A view's entities should be synchronized.
    RequestToBeSynced(RequestToBeSynced),
}

impl EventData {
    /// The wire tag of this variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ViewToBeCreated(_) => "ViewToBeCreated",
            Self::ViewToBeEdited(_) => "ViewToBeEdited",
            Self::ViewToBePatched(_) => "ViewToBePatched",
            Self::ViewCreated(_) => "ViewCreated",
            Self::ViewEdited(_) => "ViewEdited",
            Self::ViewPatched(_) => "ViewPatched",
            Self::ViewDeleted(_) => "ViewDeleted",
            Self::RequestToBeSynced(_) => "RequestToBeSynced",
        }
    }

    /// The game the event concerns.
    #[must_use]
    pub fn game(&self) -> Game {
        match self {
            Self::ViewToBeCreated(e) => e.game,
            Self::ViewToBeEdited(e) => e.game,
            Self::ViewToBePatched(e) => e.game,
            Self::ViewCreated(e) => e.game,
            Self::ViewEdited(e) => e.game,
            Self::ViewPatched(e) => e.game,
            Self::ViewDeleted(e) => e.game,
            Self::RequestToBeSynced(e) => e.game,
        }
    }
}

/// A domain event as appended to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Logical stream the event belongs to (e.g. `/credentials/{owner}`).
    pub aggregate_root: String,
    /// Caller-supplied correlation id, reused by the completion event.
    pub operation_id: String,
    /// Event payload.
    pub event_data: EventData,
}

impl Event {
    /// Builds the event a processor appends to complete `self`.
    #[must_use]
    pub fn completion(&self, event_data: EventData) -> Self {
        Self {
            aggregate_root: self.aggregate_root.clone(),
            operation_id: self.operation_id.clone(),
            event_data,
        }
    }
}

/// An event together with the global version the store assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWithVersion {
    /// Global, strictly increasing, gapless version.
    pub version: i64,
    /// The event.
    pub event: Event,
}

/// Descriptor of an appended event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation id of the event.
    pub id: String,
    /// Aggregate root of the event.
    pub aggregate_root: String,
    /// Wire tag of the event.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Version assigned to the event.
    pub version: i64,
}

/// Aggregate root for events issued on behalf of `owner`.
#[must_use]
pub fn credentials_root(owner: &str) -> String {
    format!("/credentials/{owner}")
}
