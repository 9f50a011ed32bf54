use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use leaderview_core::error::ClientError;
use leaderview_core::http::{build_url, read_json};
use leaderview_core::retry::{FixedDelayConfig, retry_with_fixed_delay};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::slug;
use crate::client::{BlizzardClient, BlizzardNamespace};
use crate::domain::{CharacterProfile, GuildRoster};

/// Tokens are refreshed this long before Blizzard expires them.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Battle.net credentials and endpoints.
#[derive(Debug, Clone)]
pub struct BlizzardApiConfig {
    pub client_id: String,
    pub client_secret: String,
    /// e.g. `https://oauth.battle.net/token`
    pub oauth_url: String,
    /// API host with a `{region}` placeholder, e.g.
    /// `https://{region}.api.blizzard.com`
    pub api_url: String,
    pub locale: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Blizzard profile API client authenticating with the client credentials
/// flow. The access token is cached until shortly before it expires.
pub struct HttpBlizzardClient {
    client: reqwest::Client,
    config: BlizzardApiConfig,
    retry: FixedDelayConfig,
    token: Mutex<Option<AccessToken>>,
}

impl HttpBlizzardClient {
    /// Creates a new `HttpBlizzardClient`.
    #[must_use]
    pub fn new(config: BlizzardApiConfig, retry: FixedDelayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            retry,
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, ClientError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let sent = self
            .client
            .post(&self.config.oauth_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await;
        let fresh: TokenResponse = read_json(sent).await?;
        info!(expires_in = fresh.expires_in, "blizzard access token refreshed");

        let value = fresh.access_token;
        *cached = Some(AccessToken {
            value: value.clone(),
            expires_at: Utc::now()
                + Duration::seconds(fresh.expires_in - TOKEN_EXPIRY_MARGIN_SECS),
        });
        Ok(value)
    }

    fn api_url(
        &self,
        region: &str,
        segments: &[&str],
        namespace: &str,
    ) -> Result<Url, ClientError> {
        let base = self
            .config
            .api_url
            .replace("{region}", &region.to_lowercase());
        build_url(
            &base,
            segments,
            &[("namespace", namespace), ("locale", self.config.locale.as_str())],
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let url = &url;
        retry_with_fixed_delay(&self.retry, || async move {
            let token = self.access_token().await?;
            debug!(url = %url, "blizzard request");
            let sent = self.client.get(url.clone()).bearer_auth(token).send().await;
            read_json(sent).await
        })
        .await
    }
}

#[async_trait]
impl BlizzardClient for HttpBlizzardClient {
    async fn get_character(
        &self,
        namespace: BlizzardNamespace,
        region: &str,
        realm: &str,
        name: &str,
    ) -> Result<CharacterProfile, ClientError> {
        let url = self.api_url(
            region,
            &[
                "profile",
                "wow",
                "character",
                slug(realm).as_str(),
                name.to_lowercase().as_str(),
            ],
            &namespace.profile(region),
        )?;
        self.get_json(url).await
    }

    async fn get_guild_roster(
        &self,
        namespace: BlizzardNamespace,
        region: &str,
        realm: &str,
        guild: &str,
    ) -> Result<GuildRoster, ClientError> {
        let url = self.api_url(
            region,
            &[
                "data",
                "wow",
                "guild",
                slug(realm).as_str(),
                slug(guild).as_str(),
                "roster",
            ],
            &namespace.profile(region),
        )?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpBlizzardClient {
        HttpBlizzardClient::new(
            BlizzardApiConfig {
                client_id: "id".into(),
                client_secret: "secret".into(),
                oauth_url: "https://oauth.battle.net/token".into(),
                api_url: "https://{region}.api.blizzard.com".into(),
                locale: "en_US".into(),
            },
            FixedDelayConfig::default(),
        )
    }

    #[test]
    fn test_character_url_targets_the_region_host_and_namespace() {
        let client = client();

        let url = client
            .api_url(
                "EU",
                &["profile", "wow", "character", "nek-rosh", "grimbly"],
                &BlizzardNamespace::Hardcore.profile("EU"),
            )
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://eu.api.blizzard.com/profile/wow/character/nek-rosh/grimbly?namespace=profile-classic1x-eu&locale=en_US"
        );
    }

    #[tokio::test]
    async fn test_cached_token_is_reused_until_expiry() {
        // Arrange
        let client = client();
        *client.token.lock().await = Some(AccessToken {
            value: "cached".into(),
            expires_at: Utc::now() + Duration::minutes(5),
        });

        // Act
        let token = client.access_token().await.unwrap();

        // Assert
        assert_eq!(token, "cached");
    }
}
