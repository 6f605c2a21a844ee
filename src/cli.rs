//! Command-line interface for moviegems
//!
//! This module handles parsing of CLI arguments using clap and the pure
//! formatting helpers behind each subcommand's output.

use std::cmp::Ordering;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::{ConfigError, Settings};
use crate::data::{Dataset, GenreMap, Value, GEMS_SCORE, GENRES_STR, TITLE, YEAR};

/// Error types for CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    /// Settings could not be resolved at startup
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `repair` was asked to fix a cache that could not be loaded
    #[error("No loadable dataset cache at {0}")]
    NothingToRepair(PathBuf),

    /// The repaired dataset could not be written back
    #[error("Failed to write repaired dataset to {0}")]
    SaveFailed(PathBuf),

    /// The cache file exists but could not be removed
    #[error("Failed to delete dataset cache at {0}")]
    DeleteFailed(PathBuf),

    /// The genre list could not be fetched
    #[error("Genre map is empty; check the TMDB token and network access")]
    NoGenres,
}

/// moviegems - Maintain the local hidden-gems movie dataset cache
#[derive(Parser, Debug)]
#[command(name = "moviegems")]
#[command(about = "Inspect and maintain the local movie dataset cache")]
#[command(version)]
pub struct Cli {
    /// Path of the dataset cache file (overrides MOVIEGEMS_DATA_FILE)
    #[arg(long, value_name = "PATH", global = true)]
    pub data_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show the cached dataset, best hidden gems first
    Show {
        /// Number of movies to list
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Load the cache, restore missing derived columns and write it back
    Repair,
    /// Delete the cache file
    Clear,
    /// Print the TMDB genre map
    Genres,
}

impl Cli {
    /// Applies command-line overrides on top of environment settings
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(path) = &self.data_file {
            settings.data_file = path.clone();
        }
        settings
    }
}

/// One line of `show` output
#[derive(Debug, Clone, PartialEq)]
pub struct GemSummary {
    pub title: String,
    pub year: Option<i64>,
    pub genres: String,
    pub score: f64,
}

impl std::fmt::Display for GemSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let year = self
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "----".to_string());
        write!(
            f,
            "{:>8.3}  {}  {} ({})",
            self.score, year, self.title, self.genres
        )
    }
}

/// Returns the `limit` rows with the highest `gems_score`
pub fn top_gems(dataset: &Dataset, limit: usize) -> Vec<GemSummary> {
    let mut gems: Vec<GemSummary> = (0..dataset.len())
        .map(|row| GemSummary {
            title: text_cell(dataset, row, TITLE).unwrap_or_else(|| "(untitled)".to_string()),
            year: dataset.row_value(row, YEAR).and_then(Value::as_i64),
            genres: text_cell(dataset, row, GENRES_STR).unwrap_or_default(),
            score: dataset
                .row_value(row, GEMS_SCORE)
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
        })
        .collect();

    gems.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    gems.truncate(limit);
    gems
}

fn text_cell(dataset: &Dataset, row: usize, name: &str) -> Option<String> {
    match dataset.row_value(row, name)? {
        Value::Null => None,
        value => Some(value.as_str().map_or_else(|| value.to_field(), String::from)),
    }
}

/// Formats the genre map as `id  name` lines sorted by ID
pub fn format_genre_map(genres: &GenreMap) -> Vec<String> {
    let mut entries: Vec<(&i64, &String)> = genres.iter().collect();
    entries.sort_by_key(|(id, _)| **id);
    entries
        .into_iter()
        .map(|(id, name)| format!("{:>6}  {}", id, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings() -> Settings {
        Settings {
            data_file: PathBuf::from("from_env.csv"),
            genre_cache_ttl: Duration::from_secs(60),
            genre_url: "http://localhost/genres".to_string(),
            bearer_token: "Bearer abc".to_string(),
        }
    }

    fn dataset() -> Dataset {
        Dataset::new()
            .with_column(TITLE, vec!["Heat".into(), "Primer".into(), Value::Null])
            .unwrap()
            .with_column(YEAR, vec![Value::Int(1995), Value::Int(2004), Value::Null])
            .unwrap()
            .with_column(
                GENRES_STR,
                vec!["Action, Crime".into(), "Science Fiction".into(), "Unknown".into()],
            )
            .unwrap()
            .with_column(
                GEMS_SCORE,
                vec![Value::Float(0.9), Value::Float(2.5), Value::Float(1.2)],
            )
            .unwrap()
    }

    #[test]
    fn test_cli_parse_show_default_limit() {
        let cli = Cli::parse_from(["moviegems", "show"]);
        assert_eq!(cli.command, Command::Show { limit: 10 });
        assert!(cli.data_file.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["moviegems", "show", "--limit", "3", "--data-file", "x.csv", "-v"]);
        assert_eq!(cli.command, Command::Show { limit: 3 });
        assert_eq!(cli.data_file, Some(PathBuf::from("x.csv")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_other_commands() {
        assert_eq!(Cli::parse_from(["moviegems", "repair"]).command, Command::Repair);
        assert_eq!(Cli::parse_from(["moviegems", "clear"]).command, Command::Clear);
        assert_eq!(Cli::parse_from(["moviegems", "genres"]).command, Command::Genres);
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["moviegems"]).is_err());
    }

    #[test]
    fn test_apply_overrides_data_file() {
        let cli = Cli::parse_from(["moviegems", "--data-file", "cli.csv", "clear"]);
        assert_eq!(cli.apply(settings()).data_file, PathBuf::from("cli.csv"));

        let cli = Cli::parse_from(["moviegems", "clear"]);
        assert_eq!(cli.apply(settings()).data_file, PathBuf::from("from_env.csv"));
    }

    #[test]
    fn test_top_gems_sorted_by_score() {
        let gems = top_gems(&dataset(), 2);

        assert_eq!(gems.len(), 2);
        assert_eq!(gems[0].title, "Primer");
        assert_eq!(gems[0].year, Some(2004));
        assert_eq!(gems[1].title, "(untitled)");
        assert_eq!(gems[1].year, None);
    }

    #[test]
    fn test_top_gems_tolerates_missing_columns() {
        let dataset = Dataset::new()
            .with_column("id", vec![Value::Int(1)])
            .unwrap();

        let gems = top_gems(&dataset, 5);

        assert_eq!(gems.len(), 1);
        assert_eq!(gems[0].score, 0.0);
        assert_eq!(gems[0].genres, "");
    }

    #[test]
    fn test_gem_summary_display() {
        let gem = GemSummary {
            title: "Primer".to_string(),
            year: Some(2004),
            genres: "Science Fiction".to_string(),
            score: 2.5,
        };
        assert_eq!(gem.to_string(), "   2.500  2004  Primer (Science Fiction)");
    }

    #[test]
    fn test_format_genre_map_sorted_by_id() {
        let genres = GenreMap::from([
            (28, "Action".to_string()),
            (12, "Adventure".to_string()),
            (878, "Science Fiction".to_string()),
        ]);

        assert_eq!(
            format_genre_map(&genres),
            vec![
                "    12  Adventure",
                "    28  Action",
                "   878  Science Fiction"
            ]
        );
    }
}
