//! Start the EnrollHub server.

use clap::Args;

use enrollhub_api::{AppState, run_server};
use enrollhub_core::config::{AppConfig, StoreProvider};
use enrollhub_core::error::AppError;
use enrollhub_database::open_store;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the store backend
    #[arg(long, value_parser = parse_provider)]
    pub store: Option<StoreProvider>,

    /// Skip the startup roster reconciliation
    #[arg(long)]
    pub no_reconcile: bool,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(store) = args.store {
        config.database.provider = store;
    }
    if args.no_reconcile {
        config.booking.reconcile_on_startup = false;
    }
    config.validate()?;

    let store = open_store(&config.database).await?;
    run_server(AppState::new(config, store)).await
}

fn parse_provider(s: &str) -> Result<StoreProvider, String> {
    match s {
        "memory" => Ok(StoreProvider::Memory),
        "postgres" => Ok(StoreProvider::Postgres),
        other => Err(format!("unknown store '{other}', expected memory or postgres")),
    }
}
