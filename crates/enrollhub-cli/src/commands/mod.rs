//! CLI command definitions and dispatch.

pub mod config;
pub mod migrate;
pub mod reconcile;
pub mod serve;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use enrollhub_core::config::{AppConfig, LoggingConfig};
use enrollhub_core::error::AppError;

use crate::output::OutputFormat;

/// EnrollHub: batch capacity and enrollment service
#[derive(Debug, Parser)]
#[command(name = "enrollhub", version, about, long_about = None)]
pub struct Cli {
    /// Path to the base configuration file
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay (`config/{env}.toml`)
    #[arg(short, long, env = "ENROLLHUB_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(serve::ServeArgs),
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Rebuild batch rosters from active bookings
    Reconcile(reconcile::ReconcileArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Serve(args) => {
                let config = self.load_config()?;
                init_logging(&config.logging, None);
                serve::execute(args, config).await
            }
            Commands::Migrate(args) => {
                let config = self.load_config()?;
                init_logging(&config.logging, Some("warn"));
                migrate::execute(args, &config).await
            }
            Commands::Reconcile(args) => {
                let config = self.load_config()?;
                init_logging(&config.logging, Some("warn"));
                reconcile::execute(args, &config, self.format).await
            }
            Commands::Config(args) => config::execute(args, self).await,
        }
    }

    /// Load configuration from the selected file and environment.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load(&self.config, &self.env)
    }
}

/// Initialize tracing. `level_override` replaces the configured level for
/// one-shot commands; `RUST_LOG` always wins.
pub fn init_logging(config: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&config.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let result = match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
    }
}
