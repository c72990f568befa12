//! # enrollhub-database
//!
//! Persistence for batches, bookings, and the catalog records they
//! reference. The [`EnrollmentStore`] trait is the seam the service layer
//! depends on; [`MemoryStore`] serves single-node deployments and tests,
//! [`PgStore`] runs on PostgreSQL with transactional commits.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{BookingFilter, BookingState, EnrollmentStore, MemoryStore, PgStore, open_store};
