use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "mission-control")]
#[command(author, version, about = "Predefined mission registry and execution service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Path to the configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "MISSION_CONTROL_CONFIG",
        default_value = "mission-control.toml"
    )]
    pub config: PathBuf,
}

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API and run the execution engine
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,

        /// Override the configured mission folder
        #[arg(long)]
        missions: Option<PathBuf>,
    },

    /// List the missions in the mission folder
    List {
        /// Override the configured mission folder
        #[arg(long)]
        missions: Option<PathBuf>,
    },

    /// Show one mission
    Show {
        /// Mission ID
        mission_id: String,

        /// Override the configured mission folder
        #[arg(long)]
        missions: Option<PathBuf>,
    },

    /// Check every mission file in the mission folder
    Validate {
        /// Override the configured mission folder
        #[arg(long)]
        missions: Option<PathBuf>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print a single value
    Get {
        /// Section name, e.g. `server`
        section: String,
        /// Key within the section, e.g. `port`
        key: String,
    },
}
