use async_trait::async_trait;
use leaderview_core::error::ClientError;
use leaderview_core::http::{build_url, read_json};
use leaderview_core::retry::{FixedDelayConfig, retry_with_fixed_delay};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::RaiderIoClient;
use crate::domain::{RaiderIoProfile, SeasonCutoffs};

/// RaiderIO endpoint settings.
#[derive(Debug, Clone)]
pub struct RaiderIoConfig {
    /// e.g. `https://raider.io/api/v1`
    pub api_url: String,
    /// Season slug the cutoffs are read for.
    pub season: String,
}

/// RaiderIO client. Server errors and rate limiting are retried with a
/// fixed delay.
pub struct HttpRaiderIoClient {
    client: reqwest::Client,
    config: RaiderIoConfig,
    retry: FixedDelayConfig,
}

impl HttpRaiderIoClient {
    /// Creates a new `HttpRaiderIoClient`.
    #[must_use]
    pub fn new(config: RaiderIoConfig, retry: FixedDelayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            retry,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        retry_with_fixed_delay(&self.retry, || {
            debug!(url = %url, "raider.io request");
            let sent = self.client.get(url.clone()).send();
            async move { read_json(sent.await).await }
        })
        .await
    }
}

#[async_trait]
impl RaiderIoClient for HttpRaiderIoClient {
    async fn get_profile(
        &self,
        region: &str,
        realm: &str,
        name: &str,
    ) -> Result<RaiderIoProfile, ClientError> {
        let url = build_url(
            &self.config.api_url,
            &["characters", "profile"],
            &[
                ("region", region),
                ("realm", realm),
                ("name", name),
                ("fields", "mythic_plus_scores_by_season:current,gear"),
            ],
        )?;
        self.get_json(url).await
    }

    async fn get_season_cutoffs(&self, region: &str) -> Result<SeasonCutoffs, ClientError> {
        let url = build_url(
            &self.config.api_url,
            &["mythic-plus", "season-cutoffs"],
            &[("season", self.config.season.as_str()), ("region", region)],
        )?;
        self.get_json(url).await
    }
}
