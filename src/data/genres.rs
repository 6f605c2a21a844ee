//! TMDB genre list client and TTL-cached lookup
//!
//! Fetches the genre ID to name mapping from TMDB and keeps it in memory for a
//! fixed time window so that repeated lookups share a single request.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::report::{LogReporter, Reporter};

/// Default TMDB endpoint for the movie genre list
pub const TMDB_GENRE_URL: &str = "https://api.themoviedb.org/3/genre/movie/list";

/// Timeout applied to each genre list request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Language requested from TMDB
const LANGUAGE: &str = "en-US";

/// Genre ID to display name
pub type GenreMap = HashMap<i64, String>;

/// Errors that can occur when fetching the genre list
#[derive(Debug, Error)]
pub enum GenreError {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Source of the genre map
pub trait GenreFetcher: Send + Sync {
    /// Fetches the full genre map from upstream
    fn fetch(&self) -> impl Future<Output = Result<GenreMap, GenreError>> + Send;
}

/// Response body of the genre list endpoint
#[derive(Debug, Deserialize)]
struct GenreListResponse {
    #[serde(default)]
    genres: Vec<GenreEntry>,
}

#[derive(Debug, Deserialize)]
struct GenreEntry {
    id: i64,
    name: String,
}

/// Parses a genre list response body into a map
///
/// A body without a `genres` key yields an empty map.
pub fn parse_genre_response(body: &str) -> Result<GenreMap, GenreError> {
    let response: GenreListResponse = serde_json::from_str(body)?;
    Ok(response
        .genres
        .into_iter()
        .map(|genre| (genre.id, genre.name))
        .collect())
}

/// Client for the TMDB genre list endpoint
#[derive(Debug, Clone)]
pub struct TmdbGenreClient {
    http_client: Client,
    /// Full `Authorization` header value, including the `Bearer ` prefix
    authorization: String,
    /// Endpoint URL (allows override for testing)
    url: String,
}

impl TmdbGenreClient {
    /// Creates a client for the default TMDB endpoint
    ///
    /// `authorization` must already be normalized (see
    /// [`crate::config::normalize_bearer`]).
    pub fn new(authorization: impl Into<String>) -> Self {
        Self::with_url(authorization, TMDB_GENRE_URL)
    }

    /// Creates a client for a custom endpoint URL
    pub fn with_url(authorization: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            authorization: authorization.into(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl GenreFetcher for TmdbGenreClient {
    async fn fetch(&self) -> Result<GenreMap, GenreError> {
        info!("Fetching genre list from {}", self.url);

        let response = self
            .http_client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, &self.authorization)
            .query(&[("language", LANGUAGE)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;

        parse_genre_response(&text)
    }
}

/// Cached map and when it was fetched
struct CacheEntry {
    genres: GenreMap,
    fetched_at: Instant,
}

/// Read-through cache over a [`GenreFetcher`]
///
/// All calls within one TTL window share the same map. The lock is held
/// across the upstream fetch, so concurrent callers wait for the first fetch
/// instead of issuing their own.
pub struct GenreLookup<F> {
    fetcher: F,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
    reporter: Arc<dyn Reporter>,
}

impl<F: GenreFetcher> GenreLookup<F> {
    pub fn new(fetcher: F, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            entry: Mutex::new(None),
            reporter: Arc::new(LogReporter),
        }
    }

    /// Sets the sink for fetch failure warnings
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns the genre map, fetching it if the cached copy is missing or stale
    ///
    /// Never fails: on fetch error a warning is reported and an empty map is
    /// returned. The empty map is cached like any other result until the TTL
    /// runs out.
    pub async fn genre_map(&self) -> GenreMap {
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!("Genre map cache hit ({} genres)", cached.genres.len());
                return cached.genres.clone();
            }
        }

        let genres = match self.fetcher.fetch().await {
            Ok(genres) => genres,
            Err(e) => {
                self.reporter
                    .warning(&format!("Failed to fetch genre map: {}. Using empty map.", e));
                GenreMap::new()
            }
        };

        *entry = Some(CacheEntry {
            genres: genres.clone(),
            fetched_at: Instant::now(),
        });
        genres
    }

    /// Drops the cached map so the next call fetches again
    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
    }
}
