//! Route definitions for the EnrollHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.

use axum::Router;
use axum::routing::{delete, get, post, put};

use crate::handlers;
use crate::state::AppState;

/// Build the API router with every route, without middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(booking_routes())
        .merge(batch_routes())
        .merge(catalog_routes())
        .merge(admin_routes())
        .merge(health_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Booking lifecycle and payment events
fn booking_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/bookings",
            get(handlers::booking::list_bookings).post(handlers::booking::create_booking),
        )
        .route("/bookings/{id}", get(handlers::booking::get_booking))
        .route("/bookings/{id}/cancel", post(handlers::booking::cancel_booking))
        .route("/bookings/{id}/status", put(handlers::booking::update_status))
        .route("/bookings/{id}/payment", post(handlers::booking::record_payment))
}

/// Batch administration and availability
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/batches", post(handlers::batch::create_batch))
        .route(
            "/batches/{id}",
            get(handlers::batch::get_batch)
                .put(handlers::batch::update_batch)
                .delete(handlers::batch::delete_batch),
        )
        .route(
            "/batches/{id}/availability",
            get(handlers::batch::batch_availability),
        )
}

/// Students and programs
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/students", post(handlers::catalog::register_student))
        .route("/programs", post(handlers::catalog::register_program))
        .route("/programs/{id}", delete(handlers::catalog::delete_program))
        .route(
            "/programs/{id}/availability",
            get(handlers::catalog::program_availability),
        )
        .route("/programs/{id}/batches", get(handlers::catalog::open_batches))
}

/// Maintenance
fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/reconcile", post(handlers::admin::reconcile))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
