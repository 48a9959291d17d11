//! Subcommands.

pub mod batch;
pub mod config;
pub mod detect;
pub mod import;
pub mod output;
