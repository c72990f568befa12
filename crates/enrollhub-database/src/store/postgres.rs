//! PostgreSQL-backed [`EnrollmentStore`].
//!
//! Seat-moving commits run in one transaction: the versioned batch update,
//! the registry rewrite, and the booking upsert either all land or none do.
//! A future dropped mid-commit rolls the transaction back.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use enrollhub_core::error::{AppError, ErrorKind};
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{
    BatchId, BookingId, PageRequest, PageResponse, ProgramId, StudentId, UserId,
};
use enrollhub_entity::batch::Batch;
use enrollhub_entity::booking::Booking;
use enrollhub_entity::catalog::{Program, Student};

use super::{BookingFilter, BookingState, EnrollmentStore};
use crate::repositories::{BatchRepository, BookingRepository, CatalogRepository};

/// Store composed from the PostgreSQL repositories.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    batches: BatchRepository,
    bookings: BookingRepository,
    catalog: CatalogRepository,
}

impl PgStore {
    /// Build a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            batches: BatchRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            catalog: CatalogRepository::new(pool.clone()),
            pool,
        }
    }

    /// Write `batch` (and optionally `booking`) in one transaction.
    async fn commit(&self, batch: &Batch, booking: Option<&Booking>) -> AppResult<Batch> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let Some((version, updated_at)) = BatchRepository::update_versioned(&mut *tx, batch).await?
        else {
            let exists = BatchRepository::exists(&mut *tx, batch.id).await?;
            if !exists {
                return Err(AppError::not_found(format!("Batch {} not found", batch.id)));
            }
            debug!(batch_id = %batch.id, expected = batch.version, "Batch version mismatch");
            return Err(AppError::conflict(format!(
                "Batch {} was modified concurrently",
                batch.id
            )));
        };

        BatchRepository::replace_enrollments(&mut *tx, batch).await?;
        if let Some(booking) = booking {
            BookingRepository::upsert(&mut *tx, booking).await?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit enrollment", e)
        })?;

        let mut saved = batch.clone();
        saved.version = version;
        saved.updated_at = updated_at;
        Ok(saved)
    }
}

#[async_trait]
impl EnrollmentStore for PgStore {
    async fn insert_student(&self, student: &Student) -> AppResult<()> {
        self.catalog.insert_student(student).await
    }

    async fn find_student(&self, id: StudentId) -> AppResult<Option<Student>> {
        self.catalog.find_student(id).await
    }

    async fn insert_program(&self, program: &Program) -> AppResult<()> {
        self.catalog.insert_program(program).await
    }

    async fn find_program(&self, id: ProgramId) -> AppResult<Option<Program>> {
        self.catalog.find_program(id).await
    }

    async fn find_programs_by_tutor(&self, tutor_id: UserId) -> AppResult<Vec<Program>> {
        self.catalog.find_programs_by_tutor(tutor_id).await
    }

    async fn delete_program(&self, id: ProgramId) -> AppResult<bool> {
        self.catalog.delete_program(id).await
    }

    async fn insert_batch(&self, batch: &Batch) -> AppResult<()> {
        self.batches.insert(batch).await
    }

    async fn find_batch(&self, id: BatchId) -> AppResult<Option<Batch>> {
        self.batches.find_by_id(id).await
    }

    async fn find_batches_by_program(&self, program_id: ProgramId) -> AppResult<Vec<Batch>> {
        self.batches.find_by_program(program_id).await
    }

    async fn list_batch_ids(&self) -> AppResult<Vec<BatchId>> {
        self.batches.list_ids().await
    }

    async fn save_batch(&self, batch: &Batch) -> AppResult<Batch> {
        self.commit(batch, None).await
    }

    async fn delete_batch(&self, batch: &Batch) -> AppResult<bool> {
        self.batches.delete(batch).await
    }

    async fn find_booking(&self, id: BookingId) -> AppResult<Option<Booking>> {
        self.bookings.find_by_id(id).await
    }

    async fn find_active_booking(
        &self,
        student_id: StudentId,
        batch_id: BatchId,
    ) -> AppResult<Option<Booking>> {
        self.bookings.find_active(student_id, batch_id).await
    }

    async fn find_active_bookings_by_batch(&self, batch_id: BatchId) -> AppResult<Vec<Booking>> {
        self.bookings.find_active_by_batch(batch_id).await
    }

    async fn find_seat_holders_by_batch(&self, batch_id: BatchId) -> AppResult<Vec<Booking>> {
        self.bookings.find_seat_holders_by_batch(batch_id).await
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Booking>> {
        self.bookings.list(filter, page).await
    }

    async fn update_booking(&self, booking: &Booking, expected: BookingState) -> AppResult<()> {
        self.bookings.update(booking, expected).await
    }

    async fn commit_enrollment(&self, batch: &Batch, booking: &Booking) -> AppResult<Batch> {
        self.commit(batch, Some(booking)).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}
