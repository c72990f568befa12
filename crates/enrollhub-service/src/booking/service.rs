//! Booking creation, cancellation, and status transitions.
//!
//! Every operation that moves a seat or changes booking state runs under
//! the batch lock and re-reads what it needs inside the lock. The store
//! commit is a single call, so a caller that gives up mid-way leaves no
//! partial state behind.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use enrollhub_core::config::BookingConfig;
use enrollhub_core::error::AppError;
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{BatchId, BookingId, PageRequest, PageResponse, ProgramId, StudentId};
use enrollhub_database::store::{BookingFilter, BookingState, EnrollmentStore};
use enrollhub_entity::actor::ActorRole;
use enrollhub_entity::batch::Batch;
use enrollhub_entity::booking::{Booking, BookingStatus, NewBooking};

use super::should_retry;
use crate::access;
use crate::capacity::{self, BatchLocks, ledger, registry};
use crate::context::RequestContext;

/// Request to book a seat for a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    /// Student to enroll.
    pub student_id: StudentId,
    /// Program the batch belongs to.
    pub program_id: ProgramId,
    /// Batch to enroll in.
    pub batch_id: BatchId,
    /// Price in minor currency units.
    pub amount_cents: i64,
    /// Optional notes for the tutor.
    pub parent_notes: Option<String>,
}

/// Optional narrowing of a booking listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBookingsQuery {
    /// Only bookings in this status.
    pub status: Option<BookingStatus>,
    /// Only bookings for this batch.
    pub batch_id: Option<BatchId>,
}

/// Manages the booking lifecycle and the seats bookings hold.
#[derive(Debug, Clone)]
pub struct BookingService {
    /// Persistence.
    pub(crate) store: Arc<dyn EnrollmentStore>,
    /// Per-batch serialization.
    pub(crate) locks: Arc<BatchLocks>,
    /// Retry and payment behaviour.
    pub(crate) config: BookingConfig,
}

impl BookingService {
    /// Creates a new booking service.
    pub fn new(
        store: Arc<dyn EnrollmentStore>,
        locks: Arc<BatchLocks>,
        config: BookingConfig,
    ) -> Self {
        Self {
            store,
            locks,
            config,
        }
    }

    /// Book a seat in a batch for one of the parent's students.
    ///
    /// Under N concurrent requests for R < N remaining seats exactly R
    /// succeed and the rest fail with `BatchFull`.
    pub async fn create_booking(
        &self,
        ctx: &RequestContext,
        req: CreateBookingRequest,
    ) -> AppResult<Booking> {
        access::require_role(ctx, &[ActorRole::Parent], "create bookings")?;

        if req.amount_cents < 0 {
            return Err(AppError::validation("Booking amount cannot be negative"));
        }

        let student = self
            .store
            .find_student(req.student_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Student {} not found", req.student_id)))?;
        if !student.belongs_to(ctx.actor_id) {
            return Err(AppError::unauthorized(
                "Student does not belong to the requesting parent",
            ));
        }

        self.store
            .find_program(req.program_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Program {} not found", req.program_id)))?;
        self.find_batch_in(req.program_id, req.batch_id).await?;

        let guard = self.locks.acquire(req.batch_id).await?;
        let result = self.create_locked(ctx, &req).await;
        match &result {
            Ok(booking) => {
                info!(
                    booking_id = %booking.id,
                    batch_id = %booking.batch_id,
                    student_id = %booking.student_id,
                    parent_id = %booking.parent_id,
                    "Booking created"
                );
            }
            Err(e) => {
                if e.is_routine() {
                    debug!(
                        batch_id = %req.batch_id,
                        student_id = %req.student_id,
                        error = %e,
                        "Booking rejected"
                    );
                }
                self.locks
                    .release(self.store.as_ref(), req.batch_id, guard)
                    .await;
            }
        }
        result
    }

    async fn create_locked(&self, ctx: &RequestContext, req: &CreateBookingRequest) -> AppResult<Booking> {
        let mut attempt = 0;
        loop {
            match self.try_create(ctx, req).await {
                Err(e) if should_retry(&e, attempt, self.config.max_commit_retries) => {
                    attempt += 1;
                    debug!(batch_id = %req.batch_id, attempt, "Retrying booking commit");
                }
                result => return result,
            }
        }
    }

    /// One check-and-commit pass. The caller holds the batch lock.
    async fn try_create(&self, ctx: &RequestContext, req: &CreateBookingRequest) -> AppResult<Booking> {
        let batch = self.find_batch_in(req.program_id, req.batch_id).await?;

        if !batch.status.accepts_enrollment() {
            return Err(AppError::batch_closed(format!(
                "Batch {} is {} and not accepting enrollments",
                batch.id, batch.status
            )));
        }

        let duplicate = self
            .store
            .find_active_booking(req.student_id, batch.id)
            .await?
            .is_some();
        if duplicate || registry::contains(&batch, req.student_id) {
            return Err(AppError::already_enrolled(format!(
                "Student {} is already enrolled in batch {}",
                req.student_id, batch.id
            )));
        }

        if ledger::is_full(&batch) {
            return Err(AppError::batch_full(format!("Batch {} is full", batch.id)));
        }

        let now = Utc::now();
        let booking = Booking::pending(
            NewBooking {
                parent_id: ctx.actor_id,
                student_id: req.student_id,
                program_id: req.program_id,
                batch_id: batch.id,
                amount_cents: req.amount_cents,
                parent_notes: req.parent_notes.clone(),
            },
            now,
        );

        let mut next = batch;
        capacity::admit(&mut next, req.student_id, now)?;
        let saved = self.store.commit_enrollment(&next, &booking).await?;
        debug!(
            batch_id = %saved.id,
            version = saved.version,
            current_enrollment = saved.current_enrollment,
            "Enrollment committed"
        );
        Ok(booking)
    }

    /// Cancel a booking and release its seat.
    pub async fn cancel_booking(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
        reason: Option<String>,
    ) -> AppResult<Booking> {
        let booking = self.find(booking_id).await?;
        let program = self.store.find_program(booking.program_id).await?;
        if !access::can_cancel_booking(ctx, &booking, program.as_ref()) {
            return Err(AppError::unauthorized("Not allowed to cancel this booking"));
        }
        ensure_cancellable(&booking)?;

        let guard = self
            .locks
            .acquire_existing(self.store.as_ref(), booking.batch_id)
            .await?;
        let result = self.cancel_locked(booking_id, reason).await;
        if let Some(guard) = guard {
            self.locks
                .release(self.store.as_ref(), booking.batch_id, guard)
                .await;
        }
        let cancelled = result?;

        info!(
            booking_id = %cancelled.id,
            batch_id = %cancelled.batch_id,
            actor_id = %ctx.actor_id,
            "Booking cancelled"
        );
        Ok(cancelled)
    }

    /// Cancel a booking. The caller holds the lock of the booking's batch.
    pub(crate) async fn cancel_locked(
        &self,
        booking_id: BookingId,
        reason: Option<String>,
    ) -> AppResult<Booking> {
        let mut attempt = 0;
        loop {
            match self.try_cancel(booking_id, reason.clone()).await {
                Ok(booking) => return Ok(booking),
                Err(e) if should_retry(&e, attempt, self.config.max_commit_retries) => {
                    attempt += 1;
                    debug!(booking_id = %booking_id, attempt, "Retrying cancellation commit");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_cancel(&self, booking_id: BookingId, reason: Option<String>) -> AppResult<Booking> {
        let booking = self.find(booking_id).await?;
        ensure_cancellable(&booking)?;

        let now = Utc::now();
        let expected = BookingState::of(&booking);
        let mut cancelled = booking.clone();
        cancelled.status = BookingStatus::Cancelled;
        cancelled.cancelled_at = Some(now);
        cancelled.cancellation_reason = reason;
        cancelled.updated_at = now;

        match self.store.find_batch(booking.batch_id).await? {
            Some(mut batch) => {
                capacity::discharge(&mut batch, booking.student_id);
                self.store.commit_enrollment(&batch, &cancelled).await?;
            }
            None => {
                // Batch already gone: nothing to release.
                self.store.update_booking(&cancelled, expected).await?;
            }
        }
        Ok(cancelled)
    }

    /// Cancel every active booking of a batch. The caller holds the batch lock.
    pub(crate) async fn cancel_all_locked(&self, batch_id: BatchId, reason: &str) -> AppResult<usize> {
        let active = self.store.find_active_bookings_by_batch(batch_id).await?;
        for booking in &active {
            self.cancel_locked(booking.id, Some(reason.to_string())).await?;
        }
        if !active.is_empty() {
            info!(
                batch_id = %batch_id,
                cancelled = active.len(),
                reason = reason,
                "Cascade-cancelled active bookings"
            );
        }
        Ok(active.len())
    }

    /// Move a booking along its lifecycle.
    ///
    /// A target of `cancelled` goes through [`cancel_booking`](Self::cancel_booking).
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
        target: BookingStatus,
    ) -> AppResult<Booking> {
        access::require_role(
            ctx,
            &[ActorRole::Tutor, ActorRole::Admin],
            "change booking status",
        )?;
        let booking = self.find(booking_id).await?;
        match self.store.find_program(booking.program_id).await? {
            Some(program) => access::require_program_manager(ctx, &program)?,
            None if ctx.is_admin() => {}
            None => {
                return Err(AppError::unauthorized(
                    "Only an admin may manage bookings of a deleted program",
                ));
            }
        }

        if target == BookingStatus::Cancelled {
            return self.cancel_booking(ctx, booking_id, None).await;
        }

        let guard = self
            .locks
            .acquire_existing(self.store.as_ref(), booking.batch_id)
            .await?;
        let result = self.transition_locked(booking_id, target).await;
        if let Some(guard) = guard {
            self.locks
                .release(self.store.as_ref(), booking.batch_id, guard)
                .await;
        }
        let updated = result?;

        info!(
            booking_id = %booking_id,
            status = %updated.status,
            actor_id = %ctx.actor_id,
            "Booking status updated"
        );
        Ok(updated)
    }

    async fn transition_locked(&self, booking_id: BookingId, target: BookingStatus) -> AppResult<Booking> {
        let mut attempt = 0;
        loop {
            match self.try_transition(booking_id, target).await {
                Err(e) if should_retry(&e, attempt, self.config.max_commit_retries) => {
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_transition(&self, booking_id: BookingId, target: BookingStatus) -> AppResult<Booking> {
        let booking = self.find(booking_id).await?;
        if !booking.status.can_transition_to(target) {
            return Err(AppError::invalid_transition(format!(
                "Cannot move booking from {} to {}",
                booking.status, target
            )));
        }
        let expected = BookingState::of(&booking);
        let mut updated = booking;
        updated.status = target;
        updated.updated_at = Utc::now();
        self.store.update_booking(&updated, expected).await?;
        Ok(updated)
    }

    /// Fetch a booking the actor is allowed to see.
    pub async fn get_booking(&self, ctx: &RequestContext, booking_id: BookingId) -> AppResult<Booking> {
        let booking = self.find(booking_id).await?;
        let program = self.store.find_program(booking.program_id).await?;
        if !access::can_view_booking(ctx, &booking, program.as_ref()) {
            return Err(AppError::unauthorized("Not allowed to view this booking"));
        }
        Ok(booking)
    }

    /// List bookings visible to the actor, newest first.
    ///
    /// Parents see their own bookings, tutors those of their programs,
    /// admins everything.
    pub async fn list_bookings(
        &self,
        ctx: &RequestContext,
        query: ListBookingsQuery,
        page: PageRequest,
    ) -> AppResult<PageResponse<Booking>> {
        let mut filter = BookingFilter {
            batch_id: query.batch_id,
            status: query.status,
            ..Default::default()
        };
        match ctx.role {
            ActorRole::Parent => filter.parent_id = Some(ctx.actor_id),
            ActorRole::Tutor => {
                let programs = self.store.find_programs_by_tutor(ctx.actor_id).await?;
                filter.program_ids = Some(programs.into_iter().map(|p| p.id).collect());
            }
            ActorRole::Admin | ActorRole::System => {}
        }
        self.store.list_bookings(&filter, &page).await
    }

    /// The batch `batch_id` if it belongs to `program_id`.
    async fn find_batch_in(&self, program_id: ProgramId, batch_id: BatchId) -> AppResult<Batch> {
        self.store
            .find_batch(batch_id)
            .await?
            .filter(|b| b.program_id == program_id)
            .ok_or_else(|| {
                AppError::not_found(format!("Batch {batch_id} not found in program {program_id}"))
            })
    }

    pub(crate) async fn find(&self, booking_id: BookingId) -> AppResult<Booking> {
        self.store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking {booking_id} not found")))
    }
}

fn ensure_cancellable(booking: &Booking) -> AppResult<()> {
    if booking.status.can_transition_to(BookingStatus::Cancelled) {
        Ok(())
    } else {
        Err(AppError::invalid_transition(format!(
            "Booking {} is already {}",
            booking.id, booking.status
        )))
    }
}
