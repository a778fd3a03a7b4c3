//! Command-line surface.

pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ogre-healthd", version, about = "Label-driven container health-check daemon")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load configuration, initialize logging, and run until shutdown.
    Run(RunArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "ogre.toml")]
    pub config: PathBuf,

    /// Override the configured log level (e.g. "debug").
    #[arg(long, env = "OGRE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Override the configured control socket path.
    #[arg(long, env = "OGRE_SOCKET_PATH")]
    pub socket_path: Option<PathBuf>,
}
