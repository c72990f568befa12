//! PostgreSQL repositories backing [`PgStore`](crate::store::PgStore).
//!
//! Read methods run on the pool. Methods that take a `&mut PgConnection`
//! are meant to be called inside a transaction opened by the store.

pub mod batch;
pub mod booking;
pub mod catalog;

pub use batch::BatchRepository;
pub use booking::BookingRepository;
pub use catalog::CatalogRepository;

use enrollhub_core::error::{AppError, ErrorKind};

/// Partial unique index allowing one active booking per (student, batch).
pub const ACTIVE_BOOKING_INDEX: &str = "uq_bookings_active_student_batch";

/// Check constraint bounding `current_enrollment` by `max_students`.
pub const ENROLLMENT_BOUNDS_CHECK: &str = "batches_enrollment_bounds";

/// Translate a write failure, surfacing constraint violations as domain errors.
pub(crate) fn map_write_error(context: &str, err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        let constraint = db.constraint();
        if db.is_unique_violation() && constraint == Some(ACTIVE_BOOKING_INDEX) {
            return AppError::already_enrolled(
                "Student already has an active booking for this batch",
            );
        }
        if db.is_check_violation() && constraint == Some(ENROLLMENT_BOUNDS_CHECK) {
            return AppError::capacity_exceeded("Enrollment would exceed batch capacity");
        }
        if db.is_foreign_key_violation() {
            return AppError::not_found(format!("{context}: referenced record not found"));
        }
    }
    AppError::with_source(ErrorKind::Database, context.to_string(), err)
}
