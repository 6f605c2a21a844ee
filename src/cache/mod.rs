//! Cache module for storing the movie dataset on disk
//!
//! The dataset fetched from TMDB is persisted to a single CSV file so the
//! application can start without refetching. Loading tolerates cache files
//! written by older versions that lack the derived genre and score columns.

mod manager;

pub use manager::DatasetCache;
