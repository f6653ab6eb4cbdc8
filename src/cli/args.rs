//! Shared CLI argument types

use crate::cli::Cli;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored output
    #[default]
    Pretty,
    /// JSON for scripts
    Json,
}

/// Global flags passed to every command handler.
///
/// Precedence is CLI flag > environment variable > config file > default.
/// This struct holds the first two layers; the config file is merged in
/// [`CommandContext`](crate::cli::CommandContext).
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.reelscan/config.yaml)
    pub config: Option<String>,

    pub no_cache: bool,

    pub refresh: bool,

    pub api_key: Option<String>,

    /// Custom API host for development/testing
    pub api_host: Option<String>,
}

impl GlobalOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            no_cache: cli.no_cache,
            refresh: cli.refresh,
            api_key: cli.api_key.clone(),
            api_host: cli.api_host.clone(),
        }
    }

    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_cli_copies_globals() {
        let cli = Cli::try_parse_from([
            "reelscan",
            "--no-cache",
            "--refresh",
            "--config",
            "/tmp/reelscan.yaml",
            "--api-key",
            "k",
            "version",
        ])
        .unwrap();

        let opts = GlobalOptions::from_cli(&cli);

        assert!(opts.no_cache);
        assert!(opts.refresh);
        assert_eq!(opts.config_ref(), Some("/tmp/reelscan.yaml"));
        assert_eq!(opts.api_key.as_deref(), Some("k"));
        assert_eq!(opts.format, OutputFormat::Pretty);
    }
}
