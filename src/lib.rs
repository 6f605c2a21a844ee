//! moviegems library
//!
//! Local CSV cache for the TMDB movie dataset and a TTL-cached genre lookup,
//! exposed for the CLI binary and integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod report;
