//! CLI module for semcache
//!
//! Provides subcommands for operating a cache configuration offline:
//! - `validate`: check the configuration and report the resulting cache layout
//! - `replay`: run recorded queries through a cache and report hit statistics

pub mod replay;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// semcache - semantic response cache
#[derive(Parser)]
#[command(name = "semcache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to config/default and config/local)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate the cache configuration
    Validate,

    /// Replay recorded queries through a cache
    Replay(replay::ReplayArgs),
}

/// Load `.env`, the configuration and the logging subscriber
pub(crate) fn bootstrap(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = match path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    logging::init_logging(&config.logging);

    Ok(config)
}
