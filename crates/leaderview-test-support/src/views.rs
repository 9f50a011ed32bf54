//! In-memory views repository.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use leaderview_core::entity::GuildPayload;
use leaderview_core::error::DomainError;
use leaderview_core::repository::ViewsRepository;
use leaderview_core::view::{SimpleView, ViewEntity, ViewPatch};

#[derive(Debug, Default)]
struct Arena {
    views: BTreeMap<String, SimpleView>,
    aliases: HashMap<(String, i64), Option<String>>,
    guilds: HashMap<String, GuildPayload>,
}

/// Views held in memory, keyed by view id.
#[derive(Debug, Default)]
pub struct InMemoryViewsRepository {
    arena: Mutex<Arena>,
}

impl InMemoryViewsRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository already holding `views`, with their entity lists
    /// as memberships.
    #[must_use]
    pub fn with_views(views: Vec<SimpleView>) -> Self {
        let repo = Self::new();
        {
            let mut arena = repo.arena.lock().unwrap();
            for view in views {
                arena.views.insert(view.id.clone(), view);
            }
        }
        repo
    }

    /// Records a guild association for a seeded view.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_guild(self, view_id: &str, guild: GuildPayload) -> Self {
        self.arena
            .lock()
            .unwrap()
            .guilds
            .insert(view_id.to_owned(), guild);
        self
    }

    /// Returns the alias of `entity_id` in `view_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn alias(&self, view_id: &str, entity_id: i64) -> Option<String> {
        self.arena
            .lock()
            .unwrap()
            .aliases
            .get(&(view_id.to_owned(), entity_id))
            .cloned()
            .flatten()
    }

    /// Returns the guild associated with `view_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn guild(&self, view_id: &str) -> Option<GuildPayload> {
        self.arena.lock().unwrap().guilds.get(view_id).cloned()
    }

    /// Removes every view.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self) {
        *self.arena.lock().unwrap() = Arena::default();
    }
}

fn missing(id: &str) -> DomainError {
    DomainError::Infrastructure(format!("view {id} not found"))
}

#[async_trait]
impl ViewsRepository for InMemoryViewsRepository {
    async fn get(&self, id: &str) -> Result<Option<SimpleView>, DomainError> {
        Ok(self.arena.lock().unwrap().views.get(id).cloned())
    }

    async fn create(&self, view: &SimpleView) -> Result<(), DomainError> {
        let mut arena = self.arena.lock().unwrap();
        if arena.views.contains_key(&view.id) {
            return Err(DomainError::Infrastructure(format!(
                "view {} already exists",
                view.id
            )));
        }
        let mut stored = view.clone();
        stored.entities.clear();
        arena.views.insert(view.id.clone(), stored);
        Ok(())
    }

    async fn edit(&self, view: &SimpleView) -> Result<(), DomainError> {
        let mut arena = self.arena.lock().unwrap();
        let stored = arena.views.get_mut(&view.id).ok_or_else(|| missing(&view.id))?;
        stored.name.clone_from(&view.name);
        stored.published = view.published;
        stored.featured = view.featured;
        Ok(())
    }

    async fn patch(&self, id: &str, patch: &ViewPatch) -> Result<(), DomainError> {
        let mut arena = self.arena.lock().unwrap();
        arena.views.get_mut(id).ok_or_else(|| missing(id))?.apply(patch);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let mut arena = self.arena.lock().unwrap();
        arena.aliases.retain(|(view_id, _), _| view_id != id);
        arena.guilds.remove(id);
        Ok(arena.views.remove(id).is_some())
    }

    async fn associate_entities_to_view(
        &self,
        entities: &[ViewEntity],
        view_id: &str,
    ) -> Result<(), DomainError> {
        let mut arena = self.arena.lock().unwrap();
        let view = arena.views.get_mut(view_id).ok_or_else(|| missing(view_id))?;
        view.entities = entities.iter().map(|e| e.entity_id).collect();
        arena.aliases.retain(|(id, _), _| id != view_id);
        for entity in entities {
            arena
                .aliases
                .insert((view_id.to_owned(), entity.entity_id), entity.alias.clone());
        }
        Ok(())
    }

    async fn remove_entities_from_view(
        &self,
        view_id: &str,
        entity_ids: &[i64],
    ) -> Result<(), DomainError> {
        let mut arena = self.arena.lock().unwrap();
        let view = arena.views.get_mut(view_id).ok_or_else(|| missing(view_id))?;
        view.entities.retain(|id| !entity_ids.contains(id));
        arena
            .aliases
            .retain(|(id, entity_id), _| id != view_id || !entity_ids.contains(entity_id));
        Ok(())
    }

    async fn associate_guild_to_view(
        &self,
        view_id: &str,
        guild: &GuildPayload,
    ) -> Result<(), DomainError> {
        self.arena
            .lock()
            .unwrap()
            .guilds
            .insert(view_id.to_owned(), guild.clone());
        Ok(())
    }

    async fn get_guild_views(&self) -> Result<Vec<(SimpleView, GuildPayload)>, DomainError> {
        let arena = self.arena.lock().unwrap();
        Ok(arena
            .guilds
            .iter()
            .filter_map(|(id, guild)| arena.views.get(id).map(|v| (v.clone(), guild.clone())))
            .collect())
    }
}
