//! Subscription checkpoint state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a subscription is in its poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    /// Caught up with the store.
    Waiting,
    /// Part way through a batch.
    Running,
    /// Halted on an event that exhausted its retries.
    Failed,
}

impl SubscriptionStatus {
    /// Storage name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Running => "RUNNING",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WAITING" => Ok(Self::Waiting),
            "RUNNING" => Ok(Self::Running),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown subscription status: {other}")),
        }
    }
}

/// Persisted checkpoint of one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionState {
    /// Current status.
    pub status: SubscriptionStatus,
    /// Version of the last successfully processed event.
    pub version: i64,
    /// When the state was last written.
    pub time: DateTime<Utc>,
    /// Message of the error that halted the subscription.
    pub last_error: Option<String>,
}

impl SubscriptionState {
    /// The state a subscription starts in.
    #[must_use]
    pub fn initial(time: DateTime<Utc>) -> Self {
        Self {
            status: SubscriptionStatus::Waiting,
            version: 0,
            time,
            last_error: None,
        }
    }
}
