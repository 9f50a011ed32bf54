//! In-memory entity repository.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use leaderview_core::entity::{CreateEntityRequest, Entity, Game, InsertEntityRequest};
use leaderview_core::error::{DomainError, InsertError};
use leaderview_core::repository::EntityRepository;

#[derive(Debug, Default)]
struct Arena {
    next_id: i64,
    entities: BTreeMap<i64, Entity>,
}

/// Entities held in memory, keyed by id. Enforces the same
/// `(game, external key)` uniqueness as the database.
#[derive(Debug, Default)]
pub struct InMemoryEntityRepository {
    arena: Mutex<Arena>,
    updates: Mutex<Vec<(i64, InsertEntityRequest)>>,
}

impl InMemoryEntityRepository {
    /// Creates an empty repository. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository already holding `entities`. New ids continue after
    /// the largest seeded id.
    #[must_use]
    pub fn with_entities(entities: Vec<Entity>) -> Self {
        let repo = Self::new();
        {
            let mut arena = repo.arena.lock().unwrap();
            for entity in entities {
                arena.next_id = arena.next_id.max(entity.id());
                arena.entities.insert(entity.id(), entity);
            }
        }
        repo
    }

    /// Returns a snapshot of every stored entity, ordered by id.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn entities(&self) -> Vec<Entity> {
        self.arena.lock().unwrap().entities.values().cloned().collect()
    }

    /// Returns every `update` call, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn updates(&self) -> Vec<(i64, InsertEntityRequest)> {
        self.updates.lock().unwrap().clone()
    }

    /// Removes every entity and resets ids.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self) {
        *self.arena.lock().unwrap() = Arena::default();
        self.updates.lock().unwrap().clear();
    }
}

#[async_trait]
impl EntityRepository for InMemoryEntityRepository {
    async fn get(&self, request: &CreateEntityRequest) -> Result<Option<Entity>, DomainError> {
        Ok(self
            .arena
            .lock()
            .unwrap()
            .entities
            .values()
            .find(|e| e.matches(request))
            .cloned())
    }

    async fn get_by_external_key(
        &self,
        game: Game,
        key: &str,
    ) -> Result<Option<Entity>, DomainError> {
        Ok(self
            .arena
            .lock()
            .unwrap()
            .entities
            .values()
            .find(|e| e.game() == game && e.external_key() == key)
            .cloned())
    }

    async fn get_by_ids(&self, ids: &[i64], game: Game) -> Result<Vec<Entity>, DomainError> {
        let arena = self.arena.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| arena.entities.get(id))
            .filter(|e| e.game() == game)
            .cloned()
            .collect())
    }

    async fn get_all(&self, game: Game) -> Result<Vec<Entity>, DomainError> {
        Ok(self
            .arena
            .lock()
            .unwrap()
            .entities
            .values()
            .filter(|e| e.game() == game)
            .cloned()
            .collect())
    }

    async fn insert(&self, requests: &[InsertEntityRequest]) -> Result<Vec<Entity>, InsertError> {
        let mut arena = self.arena.lock().unwrap();
        for (i, request) in requests.iter().enumerate() {
            let key = request.external_key();
            let clashes_stored = arena
                .entities
                .values()
                .any(|e| e.game() == request.game() && e.external_key() == key);
            let clashes_batch = requests[..i]
                .iter()
                .any(|r| r.game() == request.game() && r.external_key() == key);
            if clashes_stored || clashes_batch {
                return Err(InsertError::AlreadyExists(key));
            }
        }

        let mut inserted = Vec::with_capacity(requests.len());
        for request in requests {
            arena.next_id += 1;
            let entity = Entity::from_insert(arena.next_id, request);
            arena.entities.insert(entity.id(), entity.clone());
            inserted.push(entity);
        }
        Ok(inserted)
    }

    async fn update(&self, id: i64, request: &InsertEntityRequest) -> Result<(), DomainError> {
        let mut arena = self.arena.lock().unwrap();
        if !arena.entities.contains_key(&id) {
            return Err(DomainError::Infrastructure(format!("entity {id} not found")));
        }
        arena.entities.insert(id, Entity::from_insert(id, request));
        self.updates.lock().unwrap().push((id, request.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use leaderview_core::entity::LolInsertRequest;

    use super::*;

    fn lol(puuid: &str) -> InsertEntityRequest {
        InsertEntityRequest::Lol(LolInsertRequest {
            name: "Caps".to_owned(),
            tag: "EUW".to_owned(),
            puuid: puuid.to_owned(),
            summoner_id: "s".to_owned(),
            summoner_icon: 1,
            summoner_level: 100,
        })
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_external_identity() {
        // Arrange
        let repo = InMemoryEntityRepository::new();
        repo.insert(&[lol("p1")]).await.unwrap();

        // Act
        let result = repo.insert(&[lol("p2"), lol("p1")]).await;

        // Assert
        assert_eq!(result, Err(InsertError::AlreadyExists("p1".to_owned())));
        assert_eq!(repo.entities().len(), 1, "failed batch inserts nothing");
    }

    #[tokio::test]
    async fn test_ids_continue_after_seeded_entities() {
        let seeded = Entity::from_insert(41, &lol("p1"));
        let repo = InMemoryEntityRepository::with_entities(vec![seeded]);

        let inserted = repo.insert(&[lol("p2")]).await.unwrap();

        assert_eq!(inserted[0].id(), 42);
    }
}
