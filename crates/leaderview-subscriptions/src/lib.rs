//! Leaderview Subscriptions: checkpointed, at-least-once event consumers.
//!
//! Each subscription tails the global event log from its own checkpoint and
//! feeds events, strictly in version order, to an [`EventProcessor`].

pub mod engine;
pub mod runner;

pub use engine::{EventProcessor, EventSubscription};
pub use runner::SubscriptionRunner;
