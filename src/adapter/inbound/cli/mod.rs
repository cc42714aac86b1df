//! CLI module graph.

pub mod command;
pub mod config;
pub mod output;
pub mod video;
pub mod viewport;

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::infrastructure::config::settings::Config;
use command::{Cli, Commands, ConfigCommand};

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Returns the first error raised by the selected command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));

    match cli.command {
        Commands::Config(ConfigCommand::Validate) => config::execute_validate(&cli.config),
        Commands::Config(ConfigCommand::Show) => {
            let config = load_or_default(&cli.config)?;
            config::execute_show(&config)
        }
        Commands::Viewport(args) => {
            let config = load_or_default(&cli.config)?;
            config.init_logging();
            viewport::execute(&config, &args).await
        }
        Commands::Video(args) => {
            let config = load_or_default(&cli.config)?;
            config.init_logging();
            video::execute(&config, &args).await
        }
    }
}

/// Load `path` if it exists, otherwise run on defaults plus environment.
fn load_or_default(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        return Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }
    debug!(path = %path.display(), "Config file not found, using defaults");
    Config::parse_toml("").context("invalid default configuration")
}
