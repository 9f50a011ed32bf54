use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use leaderview_core::error::ClientError;

use crate::client::RiotClient;
use crate::domain::{
    LeagueEntry, MatchDetails, MatchInfo, MatchMetadata, MatchParticipant, RiotAccount, Summoner,
};

fn not_found(what: &str) -> ClientError {
    ClientError::Http {
        status: 404,
        body: format!("{what} not found"),
    }
}

/// Scripted Riot API. Records every match detail request.
#[derive(Default)]
pub struct MockRiotClient {
    pub accounts: HashMap<String, RiotAccount>,
    pub summoners: HashMap<String, Summoner>,
    pub leagues: HashMap<String, Vec<LeagueEntry>>,
    pub match_ids: HashMap<(String, i32), Vec<String>>,
    pub matches: HashMap<String, MatchDetails>,
    pub failing_accounts: HashMap<String, ClientError>,
    pub match_requests: Mutex<Vec<String>>,
}

impl MockRiotClient {
    pub fn with_player(mut self, name: &str, tag: &str, puuid: &str) -> Self {
        let account = RiotAccount {
            puuid: puuid.to_owned(),
            game_name: name.to_owned(),
            tag_line: tag.to_owned(),
        };
        self.accounts
            .insert(format!("{}#{}", name.to_lowercase(), tag.to_lowercase()), account);
        self.summoners.insert(
            puuid.to_owned(),
            Summoner {
                id: format!("s-{puuid}"),
                puuid: puuid.to_owned(),
                profile_icon_id: 7,
                summoner_level: 250,
            },
        );
        self
    }

    pub fn with_league(mut self, puuid: &str, queue_type: &str, ids: &[&str]) -> Self {
        let entry = LeagueEntry {
            queue_type: queue_type.to_owned(),
            tier: "GOLD".to_owned(),
            rank: "II".to_owned(),
            league_points: 42,
            wins: 10,
            losses: 8,
        };
        if let Some(queue) = entry.queue_id() {
            self.match_ids.insert(
                (puuid.to_owned(), queue),
                ids.iter().map(|id| (*id).to_owned()).collect(),
            );
        }
        self.leagues.entry(puuid.to_owned()).or_default().push(entry);
        self
    }

    pub fn with_match(mut self, match_id: &str, players: &[&str]) -> Self {
        let participants = players
            .iter()
            .map(|puuid| MatchParticipant {
                puuid: (*puuid).to_owned(),
                champion_name: "Ahri".to_owned(),
                kills: 5,
                deaths: 2,
                assists: 9,
                win: true,
            })
            .collect();
        self.matches.insert(
            match_id.to_owned(),
            MatchDetails {
                metadata: MatchMetadata {
                    match_id: match_id.to_owned(),
                },
                info: MatchInfo {
                    game_creation: 1_767_000_000_000,
                    game_duration: 1800,
                    queue_id: 420,
                    participants,
                },
            },
        );
        self
    }

    pub fn with_failing_account(mut self, name: &str, tag: &str, err: ClientError) -> Self {
        self.failing_accounts
            .insert(format!("{}#{}", name.to_lowercase(), tag.to_lowercase()), err);
        self
    }

    pub fn match_requests(&self) -> Vec<String> {
        self.match_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RiotClient for MockRiotClient {
    async fn get_account(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<RiotAccount, ClientError> {
        let key = format!("{}#{}", game_name.to_lowercase(), tag_line.to_lowercase());
        if let Some(err) = self.failing_accounts.get(&key) {
            return Err(err.clone());
        }
        self.accounts.get(&key).cloned().ok_or_else(|| not_found(&key))
    }

    async fn get_account_by_puuid(&self, puuid: &str) -> Result<RiotAccount, ClientError> {
        self.accounts
            .values()
            .find(|a| a.puuid == puuid)
            .cloned()
            .ok_or_else(|| not_found(puuid))
    }

    async fn get_summoner(&self, puuid: &str) -> Result<Summoner, ClientError> {
        self.summoners.get(puuid).cloned().ok_or_else(|| not_found(puuid))
    }

    async fn get_leagues(&self, puuid: &str) -> Result<Vec<LeagueEntry>, ClientError> {
        Ok(self.leagues.get(puuid).cloned().unwrap_or_default())
    }

    async fn get_match_ids(
        &self,
        puuid: &str,
        queue: i32,
        count: usize,
    ) -> Result<Vec<String>, ClientError> {
        let ids = self
            .match_ids
            .get(&(puuid.to_owned(), queue))
            .cloned()
            .unwrap_or_default();
        Ok(ids.into_iter().take(count).collect())
    }

    async fn get_match(&self, match_id: &str) -> Result<MatchDetails, ClientError> {
        self.match_requests.lock().unwrap().push(match_id.to_owned());
        tokio::task::yield_now().await;
        self.matches.get(match_id).cloned().ok_or_else(|| not_found(match_id))
    }
}
