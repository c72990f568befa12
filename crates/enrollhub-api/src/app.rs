//! Application builder: wires router, middleware, and state into an Axum app.

use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use tokio::sync::watch;
use tokio::task::JoinError;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use enrollhub_core::error::{AppError, ErrorKind};
use enrollhub_core::result::AppResult;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let server = &state.config.server;
    let cors = build_cors_layer(&server.cors);
    let timeout = Duration::from_secs(server.request_timeout_seconds);

    build_router(state)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Runs the EnrollHub server until a shutdown signal arrives.
///
/// When `booking.reconcile_on_startup` is set, rosters are reconciled
/// against active bookings before the listener opens.
pub async fn run_server(state: AppState) -> AppResult<()> {
    info!("Starting EnrollHub server...");

    if state.config.booking.reconcile_on_startup {
        state.reconciler.startup_recovery().await?;
    }

    let addr = state.config.server.bind_address();
    let grace = Duration::from_secs(state.config.server.shutdown_grace_seconds);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}: {e}"), e)
    })?;

    info!(address = %addr, "EnrollHub server listening");

    let app = build_app(state);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
    });
    let mut handle = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut handle => return finish(result),
        _ = shutdown_signal() => {}
    }

    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(grace, handle).await {
        Ok(result) => finish(result),
        Err(_) => {
            warn!(
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out, dropping in-flight requests"
            );
            Ok(())
        }
    }
}

fn finish(result: Result<std::io::Result<()>, JoinError>) -> AppResult<()> {
    match result {
        Ok(Ok(())) => {
            info!("Server stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(AppError::with_source(
            ErrorKind::Internal,
            format!("Server error: {e}"),
            e,
        )),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Internal,
            format!("Server task failed: {e}"),
            e,
        )),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
