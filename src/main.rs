//! reelscan CLI - TMDB metadata and artwork for movie libraries

use clap::Parser;

use reelscan::cli::{self, CacheCommands, Cli, Commands, GlobalOptions};
use reelscan::error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Movie(args) => cli::movie::run(&opts, args).await,
        Commands::Image(args) => cli::image::run(&opts, args).await,
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Status => cli::cache::status(&opts),
            CacheCommands::Clear { expired } => cli::cache::clear(&opts, expired),
            CacheCommands::Path => cli::cache::path(&opts),
        },
        Commands::Version => {
            println!("reelscan version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings, or everything from reelscan with --debug
fn init_logging(debug: bool) {
    let default_filter = if debug { "reelscan=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
