//! Leaderview Views: user-curated views of tracked characters.
//!
//! The write side validates view commands and records them as intent
//! events. The processors consume those events: the view processor resolves
//! and materializes member entities, and one sync processor per game
//! refreshes the stats of the members. The guild roster updater keeps guild
//! views in line with their rosters.

pub mod application;
pub mod domain;
