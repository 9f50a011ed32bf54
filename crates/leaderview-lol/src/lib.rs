//! Leaderview LoL: League of Legends support.
//!
//! Accounts are validated against the Riot account and summoner APIs.
//! Synchronization snapshots ranked standings together with the details of
//! recent ranked matches.

pub mod client;
pub mod domain;
pub mod http;
pub mod resolver;
pub mod synchronizer;
pub mod updater;

#[cfg(test)]
pub(crate) mod mock;

pub use client::RiotClient;
pub use http::{HttpRiotClient, RiotApiConfig};
pub use resolver::LolEntityResolver;
pub use synchronizer::LolEntitySynchronizer;
pub use updater::LolEntityUpdater;
