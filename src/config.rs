//! Runtime configuration
//!
//! Settings come from environment variables, with CLI flags layered on top in
//! `main`. The TMDB bearer token is the only required value; the process
//! refuses to start without it.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use thiserror::Error;

use crate::data::genres::TMDB_GENRE_URL;

pub const TOKEN_VAR: &str = "TMDB_BEARER_TOKEN";
pub const DATA_FILE_VAR: &str = "MOVIEGEMS_DATA_FILE";
pub const GENRE_TTL_VAR: &str = "MOVIEGEMS_GENRE_TTL_SECS";
pub const GENRE_URL_VAR: &str = "TMDB_GENRE_URL";

/// File name of the dataset cache
const DATA_FILE_NAME: &str = "movies_data.csv";

/// Default lifetime of the cached genre map (24 hours)
const DEFAULT_GENRE_TTL_SECS: u64 = 24 * 60 * 60;

/// Errors that prevent the application from starting
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TMDB credential is not set
    #[error("TMDB_BEARER_TOKEN not found in environment variables. Please set it to your TMDB API read access token.")]
    MissingToken,

    /// The genre cache TTL is not a whole number of seconds
    #[error("Invalid MOVIEGEMS_GENRE_TTL_SECS value: '{0}'")]
    InvalidTtl(String),
}

/// Resolved application settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path of the CSV dataset cache
    pub data_file: PathBuf,
    /// How long a fetched genre map stays fresh
    pub genre_cache_ttl: Duration,
    /// TMDB genre list endpoint
    pub genre_url: String,
    /// `Authorization` header value, always starting with `Bearer `
    pub bearer_token: String,
}

impl Settings {
    /// Reads settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_VAR)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let genre_cache_ttl = match lookup(GENRE_TTL_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidTtl(raw))?,
            None => Duration::from_secs(DEFAULT_GENRE_TTL_SECS),
        };

        Ok(Self {
            data_file: lookup(DATA_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(default_data_file),
            genre_cache_ttl,
            genre_url: lookup(GENRE_URL_VAR).unwrap_or_else(|| TMDB_GENRE_URL.to_string()),
            bearer_token: normalize_bearer(&token),
        })
    }
}

/// Ensures the token carries the `Bearer ` prefix
pub fn normalize_bearer(token: &str) -> String {
    if token.starts_with("Bearer ") {
        token.to_string()
    } else {
        format!("Bearer {}", token)
    }
}

/// Default dataset cache location
///
/// Uses `~/.cache/moviegems/movies_data.csv` on Linux, or the equivalent XDG
/// path on other platforms, falling back to the working directory.
pub fn default_data_file() -> PathBuf {
    ProjectDirs::from("", "", "moviegems")
        .map(|dirs| dirs.cache_dir().join(DATA_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DATA_FILE_NAME))
}
