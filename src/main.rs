//! EnrollHub Server: batch capacity and enrollment service.
//!
//! Main entry point that wires all crates together and starts the server.

use tracing_subscriber::{EnvFilter, fmt};

use enrollhub_api::{AppState, run_server};
use enrollhub_core::config::AppConfig;
use enrollhub_core::error::AppError;
use enrollhub_database::open_store;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from file, environment overlay, and variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("ENROLLHUB_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("ENROLLHUB_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Open the store and serve until shutdown.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        store = ?config.database.provider,
        "Starting EnrollHub"
    );

    let store = open_store(&config.database).await?;
    run_server(AppState::new(config, store)).await
}
