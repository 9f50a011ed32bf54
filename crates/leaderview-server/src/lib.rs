//! Leaderview server: runs the event subscriptions and the maintenance
//! task, and serves health and subscription status over HTTP.

pub mod config;
pub mod error;
pub mod maintenance;
pub mod routes;
pub mod state;
pub mod telemetry;
