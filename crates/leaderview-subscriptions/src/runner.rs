//! Background polling of subscriptions.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::EventSubscription;

/// Polls each subscription on its own task until shut down.
///
/// Subscriptions never share a task, so a slow or failing subscription does
/// not hold back the others.
pub struct SubscriptionRunner {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl SubscriptionRunner {
    /// Spawns one polling task per subscription, each ticking every
    /// `interval`. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(subscriptions: Vec<EventSubscription>, interval: Duration) -> Self {
        let (shutdown, stop) = watch::channel(false);
        let handles = subscriptions
            .into_iter()
            .map(|subscription| tokio::spawn(poll_until_stopped(subscription, interval, stop.clone())))
            .collect();
        Self { shutdown, handles }
    }

    /// Signals every task to stop and waits for in-flight polls to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(err) = handle.await {
                error!(error = %err, "subscription task panicked");
            }
        }
    }
}

async fn poll_until_stopped(
    subscription: EventSubscription,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut registered = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.changed() => break,
        }

        // Registration is retried on every tick until it succeeds.
        if !registered {
            match subscription.register().await {
                Ok(_) => {
                    registered = true;
                    info!(subscription = subscription.name(), "subscription started");
                }
                Err(err) => {
                    warn!(subscription = subscription.name(), error = %err, "failed to register subscription, retrying");
                    continue;
                }
            }
        }

        match subscription.process_pending_events().await {
            Ok(state) => debug!(
                subscription = subscription.name(),
                status = %state.status,
                version = state.version,
                "poll complete"
            ),
            Err(err) => error!(subscription = subscription.name(), error = %err, "poll failed"),
        }
    }
    info!(subscription = subscription.name(), "subscription stopped");
}
