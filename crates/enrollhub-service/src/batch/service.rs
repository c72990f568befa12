//! Batch administration for tutors and admins.
//!
//! Edits run under the batch lock so they serialize with bookings.
//! Cancelling or deleting a batch first cancels its active bookings
//! through the normal cancellation path.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use enrollhub_core::error::AppError;
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{BatchId, ProgramId};
use enrollhub_database::store::EnrollmentStore;
use enrollhub_entity::batch::{Batch, BatchStatus, CreateBatch, Weekday};
use enrollhub_entity::catalog::Program;

use crate::access;
use crate::booking::{BookingService, should_retry};
use crate::capacity::BatchLocks;
use crate::context::RequestContext;

/// Cancellation reason recorded on bookings of a deleted batch.
pub const BATCH_DELETED_REASON: &str = "Batch deleted";
/// Cancellation reason recorded on bookings of a cancelled batch.
pub const BATCH_CANCELLED_REASON: &str = "Batch cancelled";

/// Partial edit of a batch. Unset fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBatchRequest {
    /// New display name.
    pub name: Option<String>,
    /// New first day.
    pub start_date: Option<NaiveDate>,
    /// New last day.
    pub end_date: Option<NaiveDate>,
    /// New meeting days.
    pub days: Option<Vec<Weekday>>,
    /// New session start.
    pub start_time: Option<NaiveTime>,
    /// New session end.
    pub end_time: Option<NaiveTime>,
    /// New seat ceiling.
    pub max_students: Option<i32>,
    /// New scheduling status.
    pub status: Option<BatchStatus>,
}

/// Manages batch creation, edits, and deletion.
#[derive(Debug, Clone)]
pub struct BatchService {
    /// Persistence.
    store: Arc<dyn EnrollmentStore>,
    /// Per-batch serialization.
    locks: Arc<BatchLocks>,
    /// Used to cascade-cancel bookings.
    bookings: Arc<BookingService>,
}

impl BatchService {
    /// Creates a new batch service.
    pub fn new(
        store: Arc<dyn EnrollmentStore>,
        locks: Arc<BatchLocks>,
        bookings: Arc<BookingService>,
    ) -> Self {
        Self {
            store,
            locks,
            bookings,
        }
    }

    /// Create a batch with an empty roster.
    pub async fn create_batch(&self, ctx: &RequestContext, input: CreateBatch) -> AppResult<Batch> {
        let program = self.program(input.program_id).await?;
        access::require_program_manager(ctx, &program)?;

        let batch = Batch::new(input, Utc::now());
        validate_schedule(&batch)?;
        self.store.insert_batch(&batch).await?;

        info!(
            batch_id = %batch.id,
            program_id = %batch.program_id,
            max_students = batch.max_students,
            "Batch created"
        );
        Ok(batch)
    }

    /// Edit a batch's schedule, capacity, or status.
    ///
    /// `max_students` may not drop below the current enrollment. Moving the
    /// batch to `cancelled` cancels its active bookings first.
    pub async fn update_batch(
        &self,
        ctx: &RequestContext,
        batch_id: BatchId,
        req: UpdateBatchRequest,
    ) -> AppResult<Batch> {
        let batch = self.find(batch_id).await?;
        let program = self.program(batch.program_id).await?;
        access::require_program_manager(ctx, &program)?;

        let guard = self.locks.acquire(batch_id).await?;
        let mut attempt = 0;
        loop {
            match self.try_update(batch_id, &req).await {
                Ok(saved) => {
                    info!(
                        batch_id = %batch_id,
                        status = %saved.status,
                        max_students = saved.max_students,
                        version = saved.version,
                        "Batch updated"
                    );
                    return Ok(saved);
                }
                Err(e) if should_retry(&e, attempt, self.max_commit_retries()) => {
                    attempt += 1;
                    debug!(batch_id = %batch_id, attempt, "Retrying batch update");
                }
                Err(e) => {
                    self.locks.release(self.store.as_ref(), batch_id, guard).await;
                    return Err(e);
                }
            }
        }
    }

    async fn try_update(&self, batch_id: BatchId, req: &UpdateBatchRequest) -> AppResult<Batch> {
        let mut current = self.find(batch_id).await?;
        let mut next = apply_update(&current, req)?;

        if next.status == BatchStatus::Cancelled && current.status != BatchStatus::Cancelled {
            let cancelled = self
                .bookings
                .cancel_all_locked(batch_id, BATCH_CANCELLED_REASON)
                .await?;
            if cancelled > 0 {
                current = self.find(batch_id).await?;
                next = apply_update(&current, req)?;
            }
        }

        self.store.save_batch(&next).await
    }

    /// Delete a batch after cancelling its active bookings.
    ///
    /// Returns the number of bookings cancelled.
    pub async fn delete_batch(&self, ctx: &RequestContext, batch_id: BatchId) -> AppResult<usize> {
        let batch = self.find(batch_id).await?;
        let program = self.program(batch.program_id).await?;
        access::require_program_manager(ctx, &program)?;

        let cancelled = self.delete_cascade(batch_id).await?;
        info!(
            batch_id = %batch_id,
            cancelled_bookings = cancelled,
            actor_id = %ctx.actor_id,
            "Batch deleted"
        );
        Ok(cancelled)
    }

    /// Cancel a batch's active bookings and delete it, without access checks.
    ///
    /// The delete is checked against the version left by the cancellations,
    /// so a booking committed in between sends the cascade round again.
    pub(crate) async fn delete_cascade(&self, batch_id: BatchId) -> AppResult<usize> {
        let guard = self.locks.acquire(batch_id).await?;
        let mut cancelled = 0;
        let mut attempt = 0;
        loop {
            cancelled += self
                .bookings
                .cancel_all_locked(batch_id, BATCH_DELETED_REASON)
                .await?;
            let Some(batch) = self.store.find_batch(batch_id).await? else {
                break;
            };
            match self.store.delete_batch(&batch).await {
                Ok(_) => break,
                Err(e) if should_retry(&e, attempt, self.max_commit_retries()) => {
                    attempt += 1;
                    debug!(batch_id = %batch_id, attempt, "Retrying batch deletion");
                }
                Err(e) => return Err(e),
            }
        }
        drop(guard);
        self.locks.forget(batch_id);
        Ok(cancelled)
    }

    /// Commit retries allowed after a version conflict.
    pub(crate) fn max_commit_retries(&self) -> u32 {
        self.bookings.config.max_commit_retries
    }

    async fn find(&self, batch_id: BatchId) -> AppResult<Batch> {
        self.store
            .find_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Batch {batch_id} not found")))
    }

    async fn program(&self, program_id: ProgramId) -> AppResult<Program> {
        self.store
            .find_program(program_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Program {program_id} not found")))
    }
}

/// Build the edited batch, validating every change against `current`.
fn apply_update(current: &Batch, req: &UpdateBatchRequest) -> AppResult<Batch> {
    let mut next = current.clone();
    if let Some(name) = &req.name {
        next.name = name.clone();
    }
    if let Some(start_date) = req.start_date {
        next.start_date = start_date;
    }
    if let Some(end_date) = req.end_date {
        next.end_date = end_date;
    }
    if let Some(days) = &req.days {
        next.days = days.clone();
    }
    if let Some(start_time) = req.start_time {
        next.start_time = start_time;
    }
    if let Some(end_time) = req.end_time {
        next.end_time = end_time;
    }
    if let Some(max_students) = req.max_students {
        if max_students < current.current_enrollment {
            return Err(AppError::validation(format!(
                "max_students ({max_students}) cannot be lower than the current enrollment ({})",
                current.current_enrollment
            )));
        }
        next.max_students = max_students;
    }
    if let Some(status) = req.status {
        if !current.status.can_transition_to(status) {
            return Err(AppError::invalid_transition(format!(
                "Cannot move batch from {} to {status}",
                current.status
            )));
        }
        next.status = status;
    }
    validate_schedule(&next)?;
    Ok(next)
}

fn validate_schedule(batch: &Batch) -> AppResult<()> {
    if batch.name.trim().is_empty() {
        return Err(AppError::validation("Batch name cannot be empty"));
    }
    if batch.max_students < 1 {
        return Err(AppError::validation("max_students must be at least 1"));
    }
    if batch.end_date < batch.start_date {
        return Err(AppError::validation("end_date cannot be before start_date"));
    }
    if batch.end_time <= batch.start_time {
        return Err(AppError::validation("end_time must be after start_time"));
    }
    if batch.days.is_empty() {
        return Err(AppError::validation("A batch must meet on at least one day"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use enrollhub_core::error::ErrorKind;
    use enrollhub_core::types::UserId;
    use enrollhub_entity::actor::ActorRole;
    use enrollhub_entity::booking::BookingStatus;

    use super::*;
    use crate::testing::{Fixture, create_batch_input};

    #[tokio::test]
    async fn test_create_requires_owning_tutor() {
        let fx = Fixture::new(2).await;
        let input = create_batch_input(fx.program_id, 4);

        let stranger = RequestContext::new(UserId::new(), ActorRole::Tutor);
        let err = fx
            .batches
            .create_batch(&stranger, input.clone())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        let batch = fx.batches.create_batch(&fx.tutor_ctx(), input).await.unwrap();
        assert_eq!(batch.current_enrollment, 0);
        assert!(batch.enrolled_students.is_empty());
    }

    #[tokio::test]
    async fn test_create_validates_schedule() {
        let fx = Fixture::new(2).await;
        let mut input = create_batch_input(fx.program_id, 0);
        let err = fx
            .batches
            .create_batch(&fx.tutor_ctx(), input.clone())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        input.max_students = 3;
        input.end_date = input.start_date - chrono::Duration::days(1);
        let err = fx
            .batches
            .create_batch(&fx.tutor_ctx(), input)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_capacity_cannot_drop_below_enrollment() {
        let fx = Fixture::new(3).await;
        fx.book(fx.student().await).await.unwrap();
        fx.book(fx.student().await).await.unwrap();

        let err = fx
            .batches
            .update_batch(
                &fx.tutor_ctx(),
                fx.batch_id,
                UpdateBatchRequest {
                    max_students: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let saved = fx
            .batches
            .update_batch(
                &fx.tutor_ctx(),
                fx.batch_id,
                UpdateBatchRequest {
                    max_students: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.max_students, 2);
        assert!(saved.is_consistent());
    }

    #[tokio::test]
    async fn test_raising_capacity_reopens_full_batch() {
        let fx = Fixture::new(1).await;
        fx.book(fx.student().await).await.unwrap();
        let late = fx.student().await;
        assert_eq!(fx.book(late).await.unwrap_err().kind, ErrorKind::BatchFull);

        fx.batches
            .update_batch(
                &fx.admin_ctx(),
                fx.batch_id,
                UpdateBatchRequest {
                    max_students: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        fx.book(late).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelling_batch_cancels_bookings() {
        let fx = Fixture::new(3).await;
        let booking = fx.book(fx.student().await).await.unwrap();

        let saved = fx
            .batches
            .update_batch(
                &fx.tutor_ctx(),
                fx.batch_id,
                UpdateBatchRequest {
                    status: Some(BatchStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.status, BatchStatus::Cancelled);
        assert_eq!(saved.current_enrollment, 0);

        let stored = fx.store.find_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(
            stored.cancellation_reason.as_deref(),
            Some(BATCH_CANCELLED_REASON)
        );
    }

    #[tokio::test]
    async fn test_invalid_batch_status_transition() {
        let fx = Fixture::new(3).await;
        let err = fx
            .batches
            .update_batch(
                &fx.tutor_ctx(),
                fx.batch_id,
                UpdateBatchRequest {
                    status: Some(BatchStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTransition);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_bookings() {
        let fx = Fixture::new(3).await;
        let first = fx.book(fx.student().await).await.unwrap();
        let second = fx.book(fx.student().await).await.unwrap();

        let cancelled = fx
            .batches
            .delete_batch(&fx.tutor_ctx(), fx.batch_id)
            .await
            .unwrap();
        assert_eq!(cancelled, 2);
        assert!(fx.store.find_batch(fx.batch_id).await.unwrap().is_none());
        assert!(fx.locks.is_empty());

        for id in [first.id, second.id] {
            let booking = fx.store.find_booking(id).await.unwrap().unwrap();
            assert_eq!(booking.status, BookingStatus::Cancelled);
            assert_eq!(
                booking.cancellation_reason.as_deref(),
                Some(BATCH_DELETED_REASON)
            );
        }
    }
}
