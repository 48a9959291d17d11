//! Data models shared across the crate.

pub mod config;
pub mod invoice;
