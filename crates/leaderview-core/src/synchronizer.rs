//! Per-game stat synchronization.

use std::sync::Arc;

use async_trait::async_trait;

use crate::entity::{Entity, Game};
use crate::error::ServiceError;

/// Concurrent per-entity fetches during a synchronization pass.
pub const SYNC_CONCURRENCY: usize = 10;

/// Refreshes the cached stat snapshots of already-tracked entities.
#[async_trait]
pub trait EntitySynchronizer: Send + Sync {
    /// Fetches fresh stats for every entity and appends one snapshot per
    /// successful entity. Never fails as a whole: returns one error per entity
    /// that could not be synchronized.
    async fn synchronize(&self, entities: &[Entity]) -> Vec<ServiceError>;
}

/// One synchronizer per game.
#[derive(Clone)]
pub struct SynchronizerBank {
    wow: Arc<dyn EntitySynchronizer>,
    wow_hc: Arc<dyn EntitySynchronizer>,
    lol: Arc<dyn EntitySynchronizer>,
}

impl SynchronizerBank {
    /// Creates a bank from the per-game synchronizers.
    #[must_use]
    pub fn new(
        wow: Arc<dyn EntitySynchronizer>,
        wow_hc: Arc<dyn EntitySynchronizer>,
        lol: Arc<dyn EntitySynchronizer>,
    ) -> Self {
        Self { wow, wow_hc, lol }
    }

    /// The synchronizer responsible for `game`.
    #[must_use]
    pub fn for_game(&self, game: Game) -> Arc<dyn EntitySynchronizer> {
        match game {
            Game::Wow => Arc::clone(&self.wow),
            Game::WowHc => Arc::clone(&self.wow_hc),
            Game::Lol => Arc::clone(&self.lol),
        }
    }
}
