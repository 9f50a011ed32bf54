//! Database schema and column codecs shared by the repositories.

use std::str::FromStr;

use leaderview_core::entity::Game;
use leaderview_core::error::DomainError;
use sqlx::migrate::Migrator;

/// Migrations for every table used by this crate.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Wraps a database error as an infrastructure failure.
pub(crate) fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

/// Parses a `game` column.
pub(crate) fn parse_game(value: &str) -> Result<Game, DomainError> {
    Game::from_str(value).map_err(DomainError::Infrastructure)
}
