//! # enrollhub-api
//!
//! HTTP API layer for EnrollHub built on Axum.
//!
//! Provides the REST endpoints for bookings, batches, programs and
//! students, the actor extractor, middleware (request logging, CORS,
//! timeouts), DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
