//! `reqwest` clients for the Blizzard and RaiderIO APIs.

pub mod blizzard;
pub mod raider_io;

/// Blizzard realm and guild slug: lowercase, spaces and apostrophes folded.
pub(crate) fn slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace('\'', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
