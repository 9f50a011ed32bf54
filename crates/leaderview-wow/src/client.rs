//! Blizzard and RaiderIO API abstractions.

use async_trait::async_trait;
use leaderview_core::entity::Game;
use leaderview_core::error::ClientError;

use crate::domain::{CharacterProfile, GuildRoster, RaiderIoProfile, SeasonCutoffs};

/// Blizzard profile namespace family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlizzardNamespace {
    Retail,
    /// Classic Era, home of the Hardcore realms.
    Hardcore,
}

impl BlizzardNamespace {
    /// Namespace used for the characters of `game`.
    #[must_use]
    pub fn for_game(game: Game) -> Self {
        match game {
            Game::WowHc => Self::Hardcore,
            Game::Wow | Game::Lol => Self::Retail,
        }
    }

    /// The profile namespace of `region`, e.g. `profile-classic1x-eu`.
    #[must_use]
    pub fn profile(self, region: &str) -> String {
        match self {
            Self::Retail => format!("profile-{}", region.to_lowercase()),
            Self::Hardcore => format!("profile-classic1x-{}", region.to_lowercase()),
        }
    }
}

/// Blizzard profile API.
#[async_trait]
pub trait BlizzardClient: Send + Sync {
    async fn get_character(
        &self,
        namespace: BlizzardNamespace,
        region: &str,
        realm: &str,
        name: &str,
    ) -> Result<CharacterProfile, ClientError>;

    async fn get_guild_roster(
        &self,
        namespace: BlizzardNamespace,
        region: &str,
        realm: &str,
        guild: &str,
    ) -> Result<GuildRoster, ClientError>;
}

/// RaiderIO public API.
#[async_trait]
pub trait RaiderIoClient: Send + Sync {
    /// Profile with current-season Mythic+ scores and gear.
    async fn get_profile(
        &self,
        region: &str,
        realm: &str,
        name: &str,
    ) -> Result<RaiderIoProfile, ClientError>;

    /// Current-season score cutoffs of `region`.
    async fn get_season_cutoffs(&self, region: &str) -> Result<SeasonCutoffs, ClientError>;
}
