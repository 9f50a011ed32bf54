//! `reqwest` implementation of [`RiotClient`].

use async_trait::async_trait;
use leaderview_core::error::ClientError;
use leaderview_core::http::{build_url, read_json};
use leaderview_core::retry::{FixedDelayConfig, retry_with_fixed_delay};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::RiotClient;
use crate::domain::{LeagueEntry, MatchDetails, RiotAccount, Summoner};

/// Riot API endpoints and credentials.
#[derive(Debug, Clone)]
pub struct RiotApiConfig {
    /// Value of the `X-Riot-Token` header.
    pub api_key: String,
    /// Platform routing host, e.g. `https://euw1.api.riotgames.com`.
    pub platform_url: String,
    /// Regional routing host, e.g. `https://europe.api.riotgames.com`.
    pub regional_url: String,
}

/// Riot API client. Every request retries server errors and rate limiting
/// with a fixed delay.
pub struct HttpRiotClient {
    client: reqwest::Client,
    config: RiotApiConfig,
    retry: FixedDelayConfig,
}

impl HttpRiotClient {
    /// Creates a new `HttpRiotClient`.
    #[must_use]
    pub fn new(config: RiotApiConfig, retry: FixedDelayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            retry,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        retry_with_fixed_delay(&self.retry, || self.get_once(url.clone())).await
    }

    async fn get_once<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        debug!(url = %url, "riot request");
        let sent = self
            .client
            .get(url)
            .header("X-Riot-Token", &self.config.api_key)
            .send()
            .await;
        read_json(sent).await
    }
}

#[async_trait]
impl RiotClient for HttpRiotClient {
    async fn get_account(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<RiotAccount, ClientError> {
        let url = build_url(
            &self.config.regional_url,
            &["riot", "account", "v1", "accounts", "by-riot-id", game_name, tag_line],
            &[],
        )?;
        self.get_json(url).await
    }

    async fn get_account_by_puuid(&self, puuid: &str) -> Result<RiotAccount, ClientError> {
        let url = build_url(
            &self.config.regional_url,
            &["riot", "account", "v1", "accounts", "by-puuid", puuid],
            &[],
        )?;
        self.get_json(url).await
    }

    async fn get_summoner(&self, puuid: &str) -> Result<Summoner, ClientError> {
        let url = build_url(
            &self.config.platform_url,
            &["lol", "summoner", "v4", "summoners", "by-puuid", puuid],
            &[],
        )?;
        self.get_json(url).await
    }

    async fn get_leagues(&self, puuid: &str) -> Result<Vec<LeagueEntry>, ClientError> {
        let url = build_url(
            &self.config.platform_url,
            &["lol", "league", "v4", "entries", "by-puuid", puuid],
            &[],
        )?;
        self.get_json(url).await
    }

    async fn get_match_ids(
        &self,
        puuid: &str,
        queue: i32,
        count: usize,
    ) -> Result<Vec<String>, ClientError> {
        let (queue, count) = (queue.to_string(), count.to_string());
        let url = build_url(
            &self.config.regional_url,
            &["lol", "match", "v5", "matches", "by-puuid", puuid, "ids"],
            &[("queue", queue.as_str()), ("count", count.as_str())],
        )?;
        self.get_json(url).await
    }

    async fn get_match(&self, match_id: &str) -> Result<MatchDetails, ClientError> {
        let url = build_url(
            &self.config.regional_url,
            &["lol", "match", "v5", "matches", match_id],
            &[],
        )?;
        self.get_json(url).await
    }
}
