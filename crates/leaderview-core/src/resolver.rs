//! Per-game entity resolution.

use std::sync::Arc;

use async_trait::async_trait;

use crate::entity::{CreateEntityRequest, ExtraArguments, Game, ResolvedEntities};
use crate::error::ServiceError;

/// Concurrent repository lookups while partitioning requests.
pub const LOOKUP_CONCURRENCY: usize = 3;

/// Concurrent external validation calls.
pub const VALIDATION_CONCURRENCY: usize = 40;

/// Concurrent parse-heavy follow-up calls.
pub const FOLLOW_UP_CONCURRENCY: usize = 3;

/// Validates and enriches entity requests against a game's external API.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// Splits `requested` into already-tracked entities, new entities ready to
    /// insert and dropped requests. Per-request failures are dropped, never
    /// propagated.
    ///
    /// # Errors
    ///
    /// Returns a `ServiceError` only for failures that invalidate the whole
    /// batch, such as a failed guild roster lookup.
    async fn resolve(
        &self,
        requested: Vec<CreateEntityRequest>,
        extra: Option<&ExtraArguments>,
    ) -> Result<ResolvedEntities, ServiceError>;
}

/// One resolver per game.
#[derive(Clone)]
pub struct ResolverBank {
    wow: Arc<dyn EntityResolver>,
    wow_hc: Arc<dyn EntityResolver>,
    lol: Arc<dyn EntityResolver>,
}

impl ResolverBank {
    /// Creates a bank from the per-game resolvers.
    #[must_use]
    pub fn new(
        wow: Arc<dyn EntityResolver>,
        wow_hc: Arc<dyn EntityResolver>,
        lol: Arc<dyn EntityResolver>,
    ) -> Self {
        Self { wow, wow_hc, lol }
    }

    /// The resolver responsible for `game`.
    #[must_use]
    pub fn for_game(&self, game: Game) -> &dyn EntityResolver {
        match game {
            Game::Wow => self.wow.as_ref(),
            Game::WowHc => self.wow_hc.as_ref(),
            Game::Lol => self.lol.as_ref(),
        }
    }

    /// Resolves `requested` with the resolver of `game`.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's error.
    pub async fn resolve(
        &self,
        game: Game,
        requested: Vec<CreateEntityRequest>,
        extra: Option<&ExtraArguments>,
    ) -> Result<ResolvedEntities, ServiceError> {
        self.for_game(game).resolve(requested, extra).await
    }
}
