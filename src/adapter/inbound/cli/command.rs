//! Command-line interface definitions.
//!
//! Defines the CLI structure for the propview application using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Property map explorer: viewport loading and video resolution
#[derive(Parser, Debug)]
#[command(name = "propview")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the properties visible in a viewport
    Viewport(ViewportArgs),

    /// Resolve the video of a property
    Video(VideoArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `propview config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied.
    Show,
    /// Validate the configuration file.
    Validate,
}

/// Arguments for `propview viewport`.
#[derive(Args, Debug)]
pub struct ViewportArgs {
    /// Northern edge (latitude)
    #[arg(long, allow_negative_numbers = true)]
    pub north: f64,

    /// Southern edge (latitude)
    #[arg(long, allow_negative_numbers = true)]
    pub south: f64,

    /// Eastern edge (longitude)
    #[arg(long, allow_negative_numbers = true)]
    pub east: f64,

    /// Western edge (longitude)
    #[arg(long, allow_negative_numbers = true)]
    pub west: f64,

    /// Show at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for `propview video`.
#[derive(Args, Debug)]
pub struct VideoArgs {
    /// Property/resource id
    pub id: String,
}
