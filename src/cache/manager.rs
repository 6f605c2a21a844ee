//! Dataset cache backed by a single CSV file
//!
//! Provides a `DatasetCache` that saves the movie dataset to disk and reloads
//! it, repairing cache files written before the derived columns existed.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::data::{
    repair, table, Dataset, DatasetError, GenreFetcher, GenreLookup, GENRES, GENRES_STR, GENRE_IDS,
};
use crate::report::{LogReporter, Reporter};

/// Reads and writes the cached dataset at a fixed path
///
/// Failures never propagate to the caller: `save` and `delete` report errors
/// and return `false`, and `load` reports a warning and returns `None`, which
/// tells the caller to fetch fresh data from TMDB.
#[derive(Clone)]
pub struct DatasetCache {
    /// Location of the CSV file
    path: PathBuf,
    /// Sink for user-visible warnings and errors
    reporter: Arc<dyn Reporter>,
}

impl DatasetCache {
    /// Creates a cache for the CSV file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reporter: Arc::new(LogReporter),
        }
    }

    /// Sets the sink for warnings and errors
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a cache file is present
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Ensures the directory holding the cache file exists
    fn ensure_dir(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    /// Writes the dataset, replacing any existing cache file
    ///
    /// # Returns
    /// * `true` on success
    /// * `false` if the file could not be written (the error is reported)
    pub fn save(&self, dataset: &Dataset) -> bool {
        match self.write(dataset) {
            Ok(()) => {
                debug!(
                    "Cached {} rows to {}",
                    dataset.len(),
                    self.path.display()
                );
                true
            }
            Err(e) => {
                self.reporter
                    .error(&format!("Failed to save data to CSV: {}", e));
                false
            }
        }
    }

    fn write(&self, dataset: &Dataset) -> Result<(), DatasetError> {
        self.ensure_dir()?;
        let file = File::create(&self.path)?;
        table::write_dataset(dataset, BufWriter::new(file))
    }

    /// Loads the cached dataset, repairing legacy files
    ///
    /// The genre lookup is consulted only when `genres` or `genres_str` has
    /// to be rebuilt from `genre_ids`.
    ///
    /// # Returns
    /// * `Some(Dataset)` with dates, sequences and derived columns restored
    /// * `None` if there is no cache file (nothing reported)
    /// * `None` if the file could not be read or repaired (a warning is reported)
    pub async fn load<F: GenreFetcher>(&self, genres: &GenreLookup<F>) -> Option<Dataset> {
        if !self.path.exists() {
            debug!("No dataset cache at {}", self.path.display());
            return None;
        }

        match self.read(genres).await {
            Ok(dataset) => {
                debug!(
                    "Loaded {} cached rows from {}",
                    dataset.len(),
                    self.path.display()
                );
                Some(dataset)
            }
            Err(e) => {
                self.reporter.warning(&format!(
                    "Failed to load data from CSV: {}. Will fetch from TMDB instead.",
                    e
                ));
                None
            }
        }
    }

    async fn read<F: GenreFetcher>(&self, genres: &GenreLookup<F>) -> Result<Dataset, DatasetError> {
        let file = File::open(&self.path)?;
        let mut dataset = table::read_dataset(BufReader::new(file))?;

        repair::normalize(&mut dataset)?;
        if repair::needs_genre_rebuild(&dataset) {
            dataset.require(GENRE_IDS)?;
            let genre_map = genres.genre_map().await;
            repair::rebuild_genres(&mut dataset, &genre_map)?;
        }
        Ok(dataset)
    }

    /// Whether loading the file will rebuild `genres` from the genre map
    ///
    /// Only the header row is read. Unreadable or missing files answer
    /// `false`; `load` reports those.
    pub fn needs_genre_rebuild(&self) -> bool {
        let Ok(file) = File::open(&self.path) else {
            return false;
        };
        match table::read_headers(BufReader::new(file)) {
            Ok(headers) => {
                !headers.iter().any(|h| h == GENRES) || !headers.iter().any(|h| h == GENRES_STR)
            }
            Err(_) => false,
        }
    }

    /// Removes the cache file
    ///
    /// # Returns
    /// * `true` if a file was removed
    /// * `false` if there was no file (nothing reported)
    /// * `false` if removal failed (the error is reported)
    pub fn delete(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Deleted dataset cache at {}", self.path.display());
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                self.reporter
                    .error(&format!("Failed to delete CSV cache: {}", e));
                false
            }
        }
    }
}
