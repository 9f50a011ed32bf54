//! Scripted resolvers and recording synchronizers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use leaderview_core::entity::{
    CreateEntityRequest, DroppedRequest, Entity, ExtraArguments, GuildPayload, InsertEntityRequest,
    ResolvedEntities,
};
use leaderview_core::error::ServiceError;
use leaderview_core::repository::EntityRepository;
use leaderview_core::resolver::EntityResolver;
use leaderview_core::synchronizer::EntitySynchronizer;

/// A resolver that looks requests up in an entity repository and validates
/// the rest against a fixed table of known characters.
pub struct StubResolver {
    entities: Arc<dyn EntityRepository>,
    known: HashMap<String, InsertEntityRequest>,
    guild: Option<(GuildPayload, Vec<InsertEntityRequest>)>,
    failure: Option<ServiceError>,
    calls: Mutex<Vec<Vec<CreateEntityRequest>>>,
}

impl StubResolver {
    /// Creates a resolver that knows no external characters.
    #[must_use]
    pub fn new(entities: Arc<dyn EntityRepository>) -> Self {
        Self {
            entities,
            known: HashMap::new(),
            guild: None,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes `request` resolvable as a new entity. Requests match on the
    /// case-insensitive `describe()` of the user-facing request.
    #[must_use]
    pub fn with_known(mut self, request: InsertEntityRequest) -> Self {
        let key = request.to_create_request(None).describe().to_lowercase();
        self.known.insert(key, request);
        self
    }

    /// Expands guild requests into `members` and reports `guild`.
    #[must_use]
    pub fn with_guild(mut self, guild: GuildPayload, members: Vec<InsertEntityRequest>) -> Self {
        self.guild = Some((guild, members));
        self
    }

    /// Makes every call fail with `err`.
    #[must_use]
    pub fn failing(mut self, err: ServiceError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Returns the requests of every call, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<Vec<CreateEntityRequest>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntityResolver for StubResolver {
    async fn resolve(
        &self,
        requested: Vec<CreateEntityRequest>,
        extra: Option<&ExtraArguments>,
    ) -> Result<ResolvedEntities, ServiceError> {
        self.calls.lock().unwrap().push(requested.clone());
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let mut resolved = ResolvedEntities::default();
        let requested = match (&self.guild, extra.is_some_and(|e| e.is_guild)) {
            (Some((guild, members)), true) => {
                resolved.guild = Some(guild.clone());
                members.iter().map(|m| m.to_create_request(None)).collect()
            }
            _ => requested,
        };

        for request in requested {
            let alias = request.alias().map(str::to_owned);
            match self.entities.get(&request).await {
                Ok(Some(entity)) => {
                    resolved.existing.push((entity, alias));
                    continue;
                }
                Ok(None) => {}
                Err(err) => return Err(ServiceError::Storage(err.to_string())),
            }
            match self.known.get(&request.describe().to_lowercase()) {
                Some(insert) => resolved.entities.push((insert.clone(), alias)),
                None => resolved.dropped.push(DroppedRequest {
                    reason: format!("{} not found", request.describe()),
                    request,
                }),
            }
        }
        Ok(resolved)
    }
}

/// A synchronizer that records the entities it is asked to synchronize.
#[derive(Debug, Default)]
pub struct RecordingSynchronizer {
    calls: Mutex<Vec<Vec<i64>>>,
    errors: Vec<ServiceError>,
}

impl RecordingSynchronizer {
    /// Creates a synchronizer that succeeds for every entity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a synchronizer that reports `errors` on every call.
    #[must_use]
    pub fn with_errors(errors: Vec<ServiceError>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            errors,
        }
    }

    /// Returns the entity ids of every call, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<Vec<i64>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntitySynchronizer for RecordingSynchronizer {
    async fn synchronize(&self, entities: &[Entity]) -> Vec<ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push(entities.iter().map(Entity::id).collect());
        self.errors.clone()
    }
}
