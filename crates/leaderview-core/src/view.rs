//! Read model of user-curated views.

use serde::{Deserialize, Serialize};

use crate::entity::Game;

/// A materialized view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleView {
    /// View id.
    pub id: String,
    /// View name.
    pub name: String,
    /// Owner of the view.
    pub owner: String,
    /// Whether the view is publicly listed.
    pub published: bool,
    /// Game of the view.
    pub game: Game,
    /// Whether the view is featured.
    pub featured: bool,
    /// Member entity ids.
    pub entities: Vec<i64>,
}

/// Membership of an entity in a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEntity {
    /// Entity id.
    pub entity_id: i64,
    /// Display alias inside the view.
    pub alias: Option<String>,
}

/// Partial update of a view's own fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewPatch {
    /// New name.
    pub name: Option<String>,
    /// New published flag.
    pub published: Option<bool>,
    /// New featured flag.
    pub featured: Option<bool>,
}

impl SimpleView {
    /// Applies `patch` to the view's own fields.
    pub fn apply(&mut self, patch: &ViewPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
    }
}
