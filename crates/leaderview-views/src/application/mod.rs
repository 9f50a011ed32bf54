//! Command handlers, event processors and the guild roster updater.

pub mod command_handlers;
pub mod entity_materializer;
pub mod guild_roster_updater;
pub mod sync_processor;
pub mod view_processor;
