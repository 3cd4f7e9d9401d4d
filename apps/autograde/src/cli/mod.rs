//! # Autograde CLI Module
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP event bridge
//! - `simulate` - Replay a scenario file and print the transcript
//! - `config` - Print the effective configuration
//! - `catalog` - List tiers and their skins

mod commands;

use crate::error::AppError;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Autograde - automatic building-grade upgrades
///
/// Pieces placed by a player are upgraded on the spot to the player's chosen
/// tier, paid from their inventory.
#[derive(Parser, Debug)]
#[command(name = "autograde")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the TOML configuration
    #[arg(short, long, global = true, default_value = "autograde.toml")]
    pub config: PathBuf,

    /// JSON file of message overrides (key to text)
    #[arg(short, long, global = true)]
    pub lang: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format of `config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP event bridge
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Seconds between maintenance passes (0 disables)
        #[arg(short, long, default_value = "300")]
        maintenance_interval: u64,
    },

    /// Replay a scenario file
    Simulate {
        /// Path to the scenario (JSON)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Output format
        #[arg(short = 't', long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },

    /// List tiers and their skins
    Catalog,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let json_mode = cli.json_mode;
    if cli.verbose {
        tracing::info!(config = %cli.config.display(), "loading configuration");
    }
    let config = crate::settings::load_config(&cli.config)?;
    let lang = load_lang(cli.lang.as_deref())?;

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            maintenance_interval,
        }) => cmd_serve(config, lang, &host, port, maintenance_interval).await,
        Some(Commands::Simulate { file }) => cmd_simulate(config, lang, &file, json_mode),
        Some(Commands::Config { format }) => cmd_config(&config, format, json_mode),
        Some(Commands::Catalog) => cmd_catalog(&lang, json_mode),
        None => cmd_config(&config, ConfigFormat::Toml, json_mode),
    }
}
