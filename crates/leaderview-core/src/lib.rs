//! Leaderview Core: shared domain abstractions.
//!
//! This crate defines the event model, the entity and view model, the
//! repository and per-game strategy traits, the retry policies, the bounded
//! fan-out used by synchronizers and the request helpers shared by the game
//! API clients. It contains no persistence code.

pub mod clock;
pub mod command;
pub mod entity;
pub mod error;
pub mod event;
pub mod fanout;
pub mod http;
pub mod repository;
pub mod resolver;
pub mod retry;
pub mod subscription;
pub mod synchronizer;
pub mod view;
