//! Server configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use leaderview_core::retry::{ExponentialBackoffConfig, FixedDelayConfig};
use leaderview_lol::RiotApiConfig;
use leaderview_wow::{BlizzardApiConfig, RaiderIoConfig};

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_MAINTENANCE_INTERVAL_SECS: u64 = 3_600;
const DEFAULT_DATA_CACHE_TTL_HOURS: i64 = 24 * 30;

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// How often each subscription polls the event store.
    pub poll_interval: Duration,
    /// How often updaters and the retention sweep run.
    pub maintenance_interval: Duration,
    /// Snapshots older than this are swept, except each entity's newest.
    pub data_cache_ttl: chrono::Duration,
    /// Retry policy of external API calls.
    pub client_retry: FixedDelayConfig,
    /// Retry policy of subscription event processing.
    pub subscription_backoff: ExponentialBackoffConfig,
    pub riot: RiotApiConfig,
    pub blizzard: BlizzardApiConfig,
    pub raider_io: RaiderIoConfig,
    /// OTLP collector endpoint. Traces are only exported when set.
    pub otlp_endpoint: Option<String>,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let env = Env { lookup: &lookup };

        let client_defaults = FixedDelayConfig::default();
        let backoff_defaults = ExponentialBackoffConfig::default();

        Ok(Self {
            database_url: env.required("DATABASE_URL")?,
            host: env.or("HOST", DEFAULT_HOST),
            port: env.parsed("PORT", DEFAULT_PORT)?,
            poll_interval: Duration::from_millis(
                env.parsed("POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
            ),
            maintenance_interval: Duration::from_secs(
                env.parsed("MAINTENANCE_INTERVAL_SECS", DEFAULT_MAINTENANCE_INTERVAL_SECS)?,
            ),
            data_cache_ttl: chrono::Duration::hours(
                env.parsed("DATA_CACHE_TTL_HOURS", DEFAULT_DATA_CACHE_TTL_HOURS)?,
            ),
            client_retry: FixedDelayConfig {
                max_attempts: env.parsed("RETRY_MAX_ATTEMPTS", client_defaults.max_attempts)?,
                delay: env.millis("RETRY_DELAY_MS", client_defaults.delay)?,
            },
            subscription_backoff: ExponentialBackoffConfig {
                max_attempts: env.parsed("BACKOFF_MAX_ATTEMPTS", backoff_defaults.max_attempts)?,
                initial_delay: env.millis("BACKOFF_INITIAL_DELAY_MS", backoff_defaults.initial_delay)?,
                factor: env.parsed("BACKOFF_FACTOR", backoff_defaults.factor)?,
                max_delay: env.millis("BACKOFF_MAX_DELAY_MS", backoff_defaults.max_delay)?,
            },
            riot: RiotApiConfig {
                api_key: env.required("RIOT_API_KEY")?,
                platform_url: env.or("RIOT_PLATFORM_URL", "https://euw1.api.riotgames.com"),
                regional_url: env.or("RIOT_REGIONAL_URL", "https://europe.api.riotgames.com"),
            },
            blizzard: BlizzardApiConfig {
                client_id: env.required("BLIZZARD_CLIENT_ID")?,
                client_secret: env.required("BLIZZARD_CLIENT_SECRET")?,
                oauth_url: env.or("BLIZZARD_OAUTH_URL", "https://oauth.battle.net/token"),
                api_url: env.or("BLIZZARD_API_URL", "https://{region}.api.blizzard.com"),
                locale: env.or("BLIZZARD_LOCALE", "en_US"),
            },
            raider_io: RaiderIoConfig {
                api_url: env.or("RAIDER_IO_API_URL", "https://raider.io/api/v1"),
                season: env.or("RAIDER_IO_SEASON", "season-tww-3"),
            },
            otlp_endpoint: env.optional("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The address the HTTP server binds to.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

struct Env<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Env<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, AppError> {
        self.optional(key)
            .ok_or_else(|| AppError::Config(format!("{key} environment variable must be set")))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_owned())
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, AppError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
            None => Ok(default),
        }
    }

    fn millis(&self, key: &str, default: Duration) -> Result<Duration, AppError> {
        let default = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
        self.parsed(key, default).map(Duration::from_millis)
    }
}
