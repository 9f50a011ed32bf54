//! The subscription engine.
//!
//! A poll loads the subscription's checkpoint, fetches every later event and
//! folds over them one at a time. Each event is retried with exponential
//! backoff; the checkpoint advances only past events that were handled. An
//! event that exhausts its retries pins the checkpoint just before it and
//! stops the fold, so the next poll starts with that same event.

use std::sync::Arc;

use async_trait::async_trait;
use leaderview_core::clock::Clock;
use leaderview_core::error::DomainError;
use leaderview_core::event::EventWithVersion;
use leaderview_core::repository::{EventStore, SubscriptionStateRepository};
use leaderview_core::retry::{ExponentialBackoffConfig, retry_with_exponential_backoff};
use leaderview_core::subscription::{SubscriptionState, SubscriptionStatus};
use tracing::{debug, error, info, instrument};

/// Interprets versioned events for one subscription.
///
/// Variants a processor does not handle must return `Ok(())`.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Any error causes the event to be retried, then pins the subscription.
    async fn process(&self, event: &EventWithVersion) -> Result<(), DomainError>;
}

/// A named, checkpointed consumer of the event store.
#[derive(Clone)]
pub struct EventSubscription {
    name: String,
    event_store: Arc<dyn EventStore>,
    states: Arc<dyn SubscriptionStateRepository>,
    processor: Arc<dyn EventProcessor>,
    backoff: ExponentialBackoffConfig,
    clock: Arc<dyn Clock>,
}

impl EventSubscription {
    /// Creates a subscription. Call [`EventSubscription::register`] before
    /// the first poll.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        event_store: Arc<dyn EventStore>,
        states: Arc<dyn SubscriptionStateRepository>,
        processor: Arc<dyn EventProcessor>,
        backoff: ExponentialBackoffConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            event_store,
            states,
            processor,
            backoff,
            clock,
        }
    }

    /// The subscription name, which is also its checkpoint key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores the initial `{Waiting, 0}` checkpoint unless one exists.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the checkpoint store fails.
    pub async fn register(&self) -> Result<SubscriptionState, DomainError> {
        if let Some(state) = self.states.get(&self.name).await? {
            return Ok(state);
        }
        let state = SubscriptionState::initial(self.clock.now());
        self.states.save(&self.name, &state).await?;
        info!(subscription = %self.name, "subscription registered");
        Ok(state)
    }

    /// Processes every event after the checkpoint and returns the resulting
    /// state. Events appended while the batch runs are processed in the same
    /// call.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SubscriptionNotRegistered` if the subscription
    /// has no checkpoint, or the store's error if reading events or writing
    /// the checkpoint fails. Processor failures are recorded in the returned
    /// state, not returned.
    #[instrument(skip(self), fields(subscription = %self.name))]
    pub async fn process_pending_events(&self) -> Result<SubscriptionState, DomainError> {
        let mut state = self
            .states
            .get(&self.name)
            .await?
            .ok_or_else(|| DomainError::SubscriptionNotRegistered(self.name.clone()))?;

        loop {
            let events = self.event_store.get_events(state.version).await?;
            let Some(last) = events.last() else {
                return Ok(state);
            };
            let last_version = last.version;
            debug!(from = state.version, count = events.len(), "processing batch");

            for event in &events {
                if let Err(err) = retry_with_exponential_backoff(&self.backoff, || {
                    self.processor.process(event)
                })
                .await
                {
                    error!(
                        version = event.version,
                        event_type = event.event.event_data.event_type(),
                        error = %err,
                        "event processing exhausted retries, halting subscription"
                    );
                    state = SubscriptionState {
                        status: SubscriptionStatus::Failed,
                        version: event.version - 1,
                        time: self.clock.now(),
                        last_error: Some(err.to_string()),
                    };
                    self.states.save(&self.name, &state).await?;
                    return Ok(state);
                }

                state = SubscriptionState {
                    status: SubscriptionStatus::Running,
                    version: event.version,
                    time: self.clock.now(),
                    last_error: None,
                };
                self.states.save(&self.name, &state).await?;
            }

            state = SubscriptionState {
                status: SubscriptionStatus::Waiting,
                version: last_version,
                time: self.clock.now(),
                last_error: None,
            };
            self.states.save(&self.name, &state).await?;
        }
    }
}
