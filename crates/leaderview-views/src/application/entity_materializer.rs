//! Turns resolved entities into view memberships.
//!
//! New entities are inserted as one batch. When the batch collides with an
//! entity inserted since resolution, the requests are retried one by one and
//! each colliding request is re-resolved as the entity that already exists.

use std::collections::HashSet;
use std::sync::Arc;

use leaderview_core::entity::{Entity, InsertEntityRequest, ResolvedEntities};
use leaderview_core::error::{DomainError, InsertError};
use leaderview_core::repository::EntityRepository;
use leaderview_core::view::ViewEntity;
use tracing::{debug, info};

/// Inserts new entities and pairs every member with its alias.
#[derive(Clone)]
pub struct EntityMaterializer {
    entities: Arc<dyn EntityRepository>,
}

impl EntityMaterializer {
    /// Creates a materializer writing to `entities`.
    #[must_use]
    pub fn new(entities: Arc<dyn EntityRepository>) -> Self {
        Self { entities }
    }

    /// Inserts `resolved.entities` and returns the memberships of every
    /// existing and new entity, without duplicates.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Insert` if inserting fails for any reason other
    /// than a resolvable collision.
    pub async fn materialize(
        &self,
        resolved: ResolvedEntities,
    ) -> Result<Vec<ViewEntity>, DomainError> {
        let mut members: Vec<(Entity, Option<String>)> = resolved.existing;

        if !resolved.entities.is_empty() {
            let requests: Vec<InsertEntityRequest> =
                resolved.entities.iter().map(|(r, _)| r.clone()).collect();
            match self.entities.insert(&requests).await {
                Ok(inserted) => {
                    info!(count = inserted.len(), "entities inserted");
                    let aliases = resolved.entities.into_iter().map(|(_, alias)| alias);
                    members.extend(inserted.into_iter().zip(aliases));
                }
                Err(InsertError::AlreadyExists(key)) => {
                    debug!(key = %key, "batch insert collided, inserting one by one");
                    for (request, alias) in resolved.entities {
                        let entity = self.insert_or_get(&request).await?;
                        members.push((entity, alias));
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }

        let mut seen = HashSet::new();
        Ok(members
            .into_iter()
            .filter(|(entity, _)| seen.insert(entity.id()))
            .map(|(entity, alias)| ViewEntity {
                entity_id: entity.id(),
                alias,
            })
            .collect())
    }

    async fn insert_or_get(&self, request: &InsertEntityRequest) -> Result<Entity, DomainError> {
        match self.entities.insert(std::slice::from_ref(request)).await {
            Ok(mut inserted) => inserted
                .pop()
                .ok_or_else(|| InsertError::Storage("insert returned no entity".into()).into()),
            Err(InsertError::AlreadyExists(key)) => self
                .entities
                .get_by_external_key(request.game(), &key)
                .await?
                .ok_or_else(|| InsertError::AlreadyExists(key).into()),
            Err(err) => Err(err.into()),
        }
    }
}
