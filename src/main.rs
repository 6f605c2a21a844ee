//! moviegems - Maintain the local movie dataset cache
//!
//! Inspects, repairs and clears the CSV cache used by the hidden-gems movie
//! browser, and prints the TMDB genre map.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use moviegems::cache::DatasetCache;
use moviegems::cli::{format_genre_map, top_gems, Cli, CliError, Command};
use moviegems::config::Settings;
use moviegems::data::{GenreLookup, TmdbGenreClient};

/// Sets up `tracing` output on stderr; `RUST_LOG` overrides the level
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "moviegems=debug"
        } else {
            "moviegems=info"
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Command, settings: Settings) -> Result<(), CliError> {
    let client = TmdbGenreClient::with_url(settings.bearer_token.clone(), settings.genre_url.clone());
    let genres = GenreLookup::new(client, settings.genre_cache_ttl);
    let cache = DatasetCache::new(settings.data_file.clone());

    match command {
        Command::Show { limit } => match cache.load(&genres).await {
            Some(dataset) => {
                println!(
                    "{} movies cached at {}",
                    dataset.len(),
                    cache.path().display()
                );
                for gem in top_gems(&dataset, limit) {
                    println!("{}", gem);
                }
            }
            None => println!("No cached dataset at {}", cache.path().display()),
        },
        Command::Repair => {
            // Rebuilt genres are written back, so never rebuild them from a failed fetch
            if cache.needs_genre_rebuild() && genres.genre_map().await.is_empty() {
                return Err(CliError::NoGenres);
            }
            let dataset = cache
                .load(&genres)
                .await
                .ok_or_else(|| CliError::NothingToRepair(cache.path().to_path_buf()))?;
            if !cache.save(&dataset) {
                return Err(CliError::SaveFailed(cache.path().to_path_buf()));
            }
            println!(
                "Repaired {} movies at {}",
                dataset.len(),
                cache.path().display()
            );
        }
        Command::Clear => {
            let existed = cache.exists();
            if cache.delete() {
                println!("Deleted {}", cache.path().display());
            } else if existed {
                return Err(CliError::DeleteFailed(cache.path().to_path_buf()));
            } else {
                println!("No cached dataset at {}", cache.path().display());
            }
        }
        Command::Genres => {
            let genre_map = genres.genre_map().await;
            if genre_map.is_empty() {
                return Err(CliError::NoGenres);
            }
            for line in format_genre_map(&genre_map) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // The TMDB token is required before anything else runs
    let settings = match Settings::from_env() {
        Ok(settings) => cli.apply(settings),
        Err(e) => {
            eprintln!("Error: {}", CliError::from(e));
            return ExitCode::FAILURE;
        }
    };
    debug!("Using dataset cache {}", settings.data_file.display());

    match run(cli.command, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
