//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::client::ImageKind;

pub mod args;
pub mod cache;
pub mod context;
pub mod image;
pub mod movie;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// reelscan - resolve movies to TMDB metadata and artwork
#[derive(Parser, Debug)]
#[command(name = "reelscan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, json)
    #[arg(
        long,
        global = true,
        env = "REELSCAN_FORMAT",
        default_value = "pretty",
        hide_env = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "REELSCAN_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "REELSCAN_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Bypass the response cache entirely
    #[arg(long, global = true, env = "REELSCAN_NO_CACHE", hide_env = true)]
    pub no_cache: bool,

    /// Ignore cached responses but store fresh ones
    #[arg(long, global = true, env = "REELSCAN_REFRESH", hide_env = true)]
    pub refresh: bool,

    /// TMDB API key (overrides the config file)
    #[arg(long, global = true, env = "REELSCAN_API_KEY", hide_env = true)]
    pub api_key: Option<String>,

    /// Custom API host for development/testing
    #[arg(long, global = true, env = "REELSCAN_API_HOST", hide = true)]
    pub api_host: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up a movie and print its metadata
    Movie(MovieArgs),

    /// Download a single image
    Image(ImageArgs),

    /// Manage the local response cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Display version information
    Version,
}

/// Movie lookup arguments
#[derive(Debug, Clone, Args)]
pub struct MovieArgs {
    /// TMDB movie id (tried first; falls back to --title if unknown)
    #[arg(long, required_unless_present = "title")]
    pub id: Option<u64>,

    /// Title to search for
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Release year to narrow the search
    #[arg(long, short = 'y')]
    pub year: Option<i32>,

    /// Save the poster to this path
    #[arg(long)]
    pub poster: Option<PathBuf>,

    /// Save the backdrop to this path
    #[arg(long)]
    pub backdrop: Option<PathBuf>,
}

/// Image download arguments
#[derive(Debug, Clone, Args)]
pub struct ImageArgs {
    /// TMDB image path, e.g. /qJ2tW6WMUDux911r6m7haRef0WH.jpg
    #[arg(long, required_unless_present = "source", conflicts_with = "source")]
    pub fragment: Option<String>,

    /// Image size class for --fragment
    #[arg(long, value_enum, default_value = "poster")]
    pub kind: ImageKind,

    /// Full http(s) URL or local file to copy
    #[arg(long)]
    pub source: Option<String>,

    /// Destination file
    #[arg(long, short = 'o')]
    pub out: PathBuf,
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache location and entry counts
    Status,

    /// Remove cached responses
    Clear {
        /// Only remove entries past their expiry
        #[arg(long)]
        expired: bool,
    },

    /// Print the cache database path
    Path,
}
