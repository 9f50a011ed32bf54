//! View commands and their validation rules.

pub mod commands;
