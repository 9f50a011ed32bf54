//! Riot API payloads and the cached LoL snapshot.

use serde::{Deserialize, Serialize};

/// A Riot account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiotAccount {
    /// Riot PUUID.
    pub puuid: String,
    /// Riot game name.
    pub game_name: String,
    /// Riot tag line.
    pub tag_line: String,
}

/// A LoL summoner profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summoner {
    /// Encrypted summoner id.
    #[serde(default)]
    pub id: String,
    /// Riot PUUID.
    pub puuid: String,
    /// Profile icon id.
    pub profile_icon_id: i32,
    /// Summoner level.
    pub summoner_level: i64,
}

/// A ranked standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    /// Queue name, e.g. `RANKED_SOLO_5x5`.
    pub queue_type: String,
    /// Tier, e.g. `GOLD`.
    pub tier: String,
    /// Division inside the tier.
    pub rank: String,
    /// League points.
    pub league_points: i32,
    /// Ranked wins.
    pub wins: i32,
    /// Ranked losses.
    pub losses: i32,
}

impl LeagueEntry {
    /// The match-v5 queue id of this ranked queue, if matches are tracked
    /// for it.
    #[must_use]
    pub fn queue_id(&self) -> Option<i32> {
        match self.queue_type.as_str() {
            "RANKED_SOLO_5x5" => Some(420),
            "RANKED_FLEX_SR" => Some(440),
            _ => None,
        }
    }
}

/// Match-v5 match payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    /// Match metadata.
    pub metadata: MatchMetadata,
    /// Match info.
    pub info: MatchInfo,
}

/// Match metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    /// Match id, e.g. `EUW1_6871234567`.
    pub match_id: String,
}

/// Match info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    /// Epoch millis of the game start.
    pub game_creation: i64,
    /// Game length in seconds.
    pub game_duration: i64,
    /// Queue id.
    pub queue_id: i32,
    /// Every player in the match.
    pub participants: Vec<MatchParticipant>,
}

/// One player in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchParticipant {
    /// Riot PUUID.
    pub puuid: String,
    /// Champion played.
    pub champion_name: String,
    /// Kills.
    pub kills: i32,
    /// Deaths.
    pub deaths: i32,
    /// Assists.
    pub assists: i32,
    /// Whether the player's team won.
    pub win: bool,
}

/// The tracked player's side of a match, as cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: String,
    pub game_creation: i64,
    pub game_duration: i64,
    pub champion_name: String,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
    pub win: bool,
}

impl MatchSummary {
    /// Extracts the summary of `puuid` from `details`, if they played.
    #[must_use]
    pub fn of(details: &MatchDetails, puuid: &str) -> Option<Self> {
        let me = details.info.participants.iter().find(|p| p.puuid == puuid)?;
        Some(Self {
            match_id: details.metadata.match_id.clone(),
            game_creation: details.info.game_creation,
            game_duration: details.info.game_duration,
            champion_name: me.champion_name.clone(),
            kills: me.kills,
            deaths: me.deaths,
            assists: me.assists,
            win: me.win,
        })
    }
}

/// A ranked queue with its recent matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LolLeague {
    pub queue_type: String,
    pub tier: String,
    pub rank: String,
    pub league_points: i32,
    pub wins: i32,
    pub losses: i32,
    /// Recent matches, newest first.
    #[serde(default)]
    pub matches: Vec<MatchSummary>,
}

/// Payload of a LoL data cache record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LolData {
    pub summoner_icon: i32,
    pub summoner_level: i64,
    pub leagues: Vec<LolLeague>,
}

impl LolData {
    /// Recent matches of `queue_type` in this snapshot.
    #[must_use]
    pub fn matches(&self, queue_type: &str) -> &[MatchSummary] {
        self.leagues
            .iter()
            .find(|l| l.queue_type == queue_type)
            .map_or(&[], |l| l.matches.as_slice())
    }
}
