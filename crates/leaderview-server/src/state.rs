//! Shared application state.

use std::sync::Arc;

use leaderview_core::repository::SubscriptionStateRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Checkpoint store of the event subscriptions.
    pub subscription_states: Arc<dyn SubscriptionStateRepository>,
    /// Names of the subscriptions this server runs.
    pub subscriptions: Arc<[String]>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        subscription_states: Arc<dyn SubscriptionStateRepository>,
        subscriptions: Vec<String>,
    ) -> Self {
        Self {
            subscription_states,
            subscriptions: subscriptions.into(),
        }
    }
}
