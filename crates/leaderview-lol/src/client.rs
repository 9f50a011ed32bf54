//! Riot API abstraction.

use async_trait::async_trait;
use leaderview_core::error::ClientError;

use crate::domain::{LeagueEntry, MatchDetails, RiotAccount, Summoner};

/// The Riot API calls used by the resolver, synchronizer and updater.
#[async_trait]
pub trait RiotClient: Send + Sync {
    /// Looks an account up by Riot id.
    async fn get_account(&self, game_name: &str, tag_line: &str)
    -> Result<RiotAccount, ClientError>;

    /// Looks an account up by PUUID.
    async fn get_account_by_puuid(&self, puuid: &str) -> Result<RiotAccount, ClientError>;

    /// Loads the summoner profile of an account.
    async fn get_summoner(&self, puuid: &str) -> Result<Summoner, ClientError>;

    /// Loads the ranked standings of an account.
    async fn get_leagues(&self, puuid: &str) -> Result<Vec<LeagueEntry>, ClientError>;

    /// Lists the ids of the most recent matches of an account in `queue`,
    /// newest first.
    async fn get_match_ids(
        &self,
        puuid: &str,
        queue: i32,
        count: usize,
    ) -> Result<Vec<String>, ClientError>;

    /// Loads one match.
    async fn get_match(&self, match_id: &str) -> Result<MatchDetails, ClientError>;
}
