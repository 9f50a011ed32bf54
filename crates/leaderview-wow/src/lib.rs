//! Leaderview WoW: World of Warcraft retail and Hardcore support.
//!
//! Characters are validated against the Blizzard profile API. Retail
//! snapshots come from RaiderIO and carry a season percentile. Hardcore
//! snapshots come from the Classic profile API and record deaths.

pub mod client;
pub mod domain;
pub mod hardcore;
pub mod http;
pub mod resolver;
pub mod synchronizer;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{BlizzardClient, BlizzardNamespace, RaiderIoClient};
pub use hardcore::WowHardcoreEntitySynchronizer;
pub use http::blizzard::{BlizzardApiConfig, HttpBlizzardClient};
pub use http::raider_io::{HttpRaiderIoClient, RaiderIoConfig};
pub use resolver::WowEntityResolver;
pub use synchronizer::WowEntitySynchronizer;
