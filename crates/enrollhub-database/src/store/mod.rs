//! The persistence seam used by the booking services.
//!
//! Every write that touches a batch's seat accounting goes through
//! [`EnrollmentStore::commit_enrollment`] or [`EnrollmentStore::save_batch`],
//! both of which are conditional on the batch `version` the caller read.
//! A stale version yields [`ErrorKind::Conflict`](enrollhub_core::ErrorKind::Conflict).

pub mod memory;
pub mod postgres;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use enrollhub_core::config::{DatabaseConfig, StoreProvider};
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{
    BatchId, BookingId, PageRequest, PageResponse, ProgramId, StudentId, UserId,
};
use enrollhub_entity::batch::Batch;
use enrollhub_entity::booking::{Booking, BookingStatus, PaymentStatus};
use enrollhub_entity::catalog::{Program, Student};

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::connection::DatabasePool;
use crate::migration::run_migrations;

/// Open the store selected by `config.provider`.
///
/// For PostgreSQL this connects the pool and, when `auto_migrate` is set,
/// applies pending migrations before returning.
pub async fn open_store(config: &DatabaseConfig) -> AppResult<Arc<dyn EnrollmentStore>> {
    match config.provider {
        StoreProvider::Memory => {
            info!("Using in-memory enrollment store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreProvider::Postgres => {
            let pool = DatabasePool::connect(config).await?;
            if config.auto_migrate {
                run_migrations(pool.pool()).await?;
            }
            Ok(Arc::new(PgStore::new(pool.into_pool())))
        }
    }
}

/// Criteria for listing bookings. Unset fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    /// Only bookings made by this parent.
    pub parent_id: Option<UserId>,
    /// Only bookings for one of these programs.
    pub program_ids: Option<Vec<ProgramId>>,
    /// Only bookings for this batch.
    pub batch_id: Option<BatchId>,
    /// Only bookings in this status.
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    /// Whether a booking satisfies every set criterion.
    pub fn matches(&self, booking: &Booking) -> bool {
        self.parent_id.is_none_or(|p| booking.parent_id == p)
            && self
                .program_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&booking.program_id))
            && self.batch_id.is_none_or(|b| booking.batch_id == b)
            && self.status.is_none_or(|s| booking.status == s)
    }
}

/// The lifecycle fields a conditional booking update is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingState {
    /// Expected booking status.
    pub status: BookingStatus,
    /// Expected payment status.
    pub payment_status: PaymentStatus,
}

impl BookingState {
    /// Capture the current lifecycle fields of a booking.
    pub fn of(booking: &Booking) -> Self {
        Self {
            status: booking.status,
            payment_status: booking.payment_status,
        }
    }
}

/// Storage for batches, bookings, and the catalog records they reference.
#[async_trait]
pub trait EnrollmentStore: Send + Sync + Debug {
    /// Persist a new student.
    async fn insert_student(&self, student: &Student) -> AppResult<()>;

    /// Find a student by ID.
    async fn find_student(&self, id: StudentId) -> AppResult<Option<Student>>;

    /// Persist a new program.
    async fn insert_program(&self, program: &Program) -> AppResult<()>;

    /// Find a program by ID.
    async fn find_program(&self, id: ProgramId) -> AppResult<Option<Program>>;

    /// Programs taught by a tutor.
    async fn find_programs_by_tutor(&self, tutor_id: UserId) -> AppResult<Vec<Program>>;

    /// Delete a program that no longer has batches.
    ///
    /// Fails with `Conflict` while any batch of the program still exists.
    async fn delete_program(&self, id: ProgramId) -> AppResult<bool>;

    /// Persist a new batch.
    async fn insert_batch(&self, batch: &Batch) -> AppResult<()>;

    /// Find a batch by ID, registry included.
    async fn find_batch(&self, id: BatchId) -> AppResult<Option<Batch>>;

    /// Batches of a program ordered by start date.
    async fn find_batches_by_program(&self, program_id: ProgramId) -> AppResult<Vec<Batch>>;

    /// IDs of every batch.
    async fn list_batch_ids(&self) -> AppResult<Vec<BatchId>>;

    /// Write a batch if its stored version still equals `batch.version`.
    ///
    /// Returns the stored batch with its version bumped.
    async fn save_batch(&self, batch: &Batch) -> AppResult<Batch>;

    /// Delete a batch if its stored version still equals `batch.version`.
    ///
    /// Bookings are kept. Fails with `Conflict` on a version mismatch.
    async fn delete_batch(&self, batch: &Batch) -> AppResult<bool>;

    /// Find a booking by ID.
    async fn find_booking(&self, id: BookingId) -> AppResult<Option<Booking>>;

    /// The active booking of a student in a batch, if any.
    async fn find_active_booking(
        &self,
        student_id: StudentId,
        batch_id: BatchId,
    ) -> AppResult<Option<Booking>>;

    /// Active bookings referencing a batch, oldest first.
    async fn find_active_bookings_by_batch(&self, batch_id: BatchId) -> AppResult<Vec<Booking>>;

    /// Bookings that occupy a seat in a batch (active or completed), oldest first.
    async fn find_seat_holders_by_batch(&self, batch_id: BatchId) -> AppResult<Vec<Booking>>;

    /// Bookings matching a filter, newest first.
    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Booking>>;

    /// Overwrite a booking's mutable fields without touching its batch.
    ///
    /// Used for status and payment changes that do not move a seat. Fails
    /// with `Conflict` if the stored booking no longer matches `expected`.
    async fn update_booking(&self, booking: &Booking, expected: BookingState) -> AppResult<()>;

    /// Atomically write a batch (version-checked) and insert or update a booking.
    ///
    /// Fails with `AlreadyEnrolled` if the booking is active and another
    /// active booking exists for the same student and batch, and with
    /// `Conflict` if the stored booking is already completed or cancelled.
    /// Nothing is written on failure.
    async fn commit_enrollment(&self, batch: &Batch, booking: &Booking) -> AppResult<Batch>;

    /// Whether the backing store is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
