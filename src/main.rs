mod api_request;
mod apple_music_rs;
mod config;
mod database;
mod engine;
mod entities;
mod http_server;
mod logging;
mod ports;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, OptionExt, eyre},
};

use crate::{
    config::{APP_NAME, Config},
    engine::Engine,
    ports::config_store::ConfigStore,
    services::{storage::open_store, sync::SyncStateStore},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, global = true, env = "PLAYLIST_MIRROR_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `playlist_mirror=debug`
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// OTLP gRPC endpoint to export traces to
    #[arg(long, global = true, env = "OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API and run the periodic sync in the background
    Serve {
        /// The port to run the server on
        #[arg(short, long, default_value = "3000", env = "PLAYLIST_MIRROR_HTTP_PORT")]
        port: u16,
    },
    /// Sync a single Spotify playlist into its Apple Music mirror
    Sync {
        /// The Spotify playlist id
        playlist_id: String,
    },
    /// Sync every playlist listed in the config file
    SyncAll,
    /// Print the persisted sync state
    Status,
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider =
        logging::init_tracing(APP_NAME, args.otlp_endpoint.as_deref(), &args.log_level)?;

    let result = run(args).await;

    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            eprintln!("Failed to flush traces: {e}");
        }
    }
    result
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    tracing::debug!("Loading configuration");
    Config::load(path).wrap_err("Failed to load playlist-mirror config")
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Serve { port } => {
            let config = load_config(args.config.as_deref())?;
            let engine = Engine::build(&config).await?;
            tracing::info!("Starting HTTP server on port: {}", port);
            http_server::app::start(port, engine, config.sync_interval()).await?;
        }
        Commands::Sync { playlist_id } => {
            let config = load_config(args.config.as_deref())?;
            let engine = Engine::build(&config).await?;
            let report = engine
                .scheduler
                .orchestrator()
                .sync_playlist(&playlist_id)
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::SyncAll => {
            let config = load_config(args.config.as_deref())?;
            let engine = Engine::build(&config).await?;
            let report = engine.scheduler.sync_all_configured().await;
            for synced in &report.succeeded {
                println!(
                    "{}: {} tracks added, {} unmatched",
                    synced.playlist_id,
                    synced.tracks_added,
                    synced.unmatched.len()
                );
            }
            for (playlist_id, e) in &report.failed {
                println!("{playlist_id}: failed: {e}");
            }
            if !report.failed.is_empty() {
                return Err(eyre!(
                    "{} of {} playlists failed to sync",
                    report.failed.len(),
                    report.failed.len() + report.succeeded.len()
                ));
            }
        }
        Commands::Status => {
            let config = load_config(args.config.as_deref())?;
            let state = SyncStateStore::new(open_store(&config).await?)
                .read()
                .await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Commands::Config(config_command) => {
            let path = match args.config {
                Some(path) => path,
                None => Config::config_path().ok_or_eyre("Could not determine config directory")?,
            };
            match config_command {
                ConfigCommands::CreateDefault => {
                    Config::create_default(&path)?;
                    tracing::info!("Default config created at {}", path.display());
                }
                ConfigCommands::Path => println!("{}", path.display()),
            }
        }
    }

    Ok(())
}
