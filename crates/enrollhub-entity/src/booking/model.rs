//! Booking entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use enrollhub_core::types::{BatchId, BookingId, ProgramId, StudentId, UserId};

use super::payment::{PaymentMethod, PaymentStatus};
use super::status::BookingStatus;

/// A parent's enrollment of one student in one batch.
///
/// References are fixed at creation. Bookings are never deleted;
/// cancellation is a status change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// Parent who made (and pays for) the booking.
    pub parent_id: UserId,
    /// Enrolled student.
    pub student_id: StudentId,
    /// Program the batch belongs to.
    pub program_id: ProgramId,
    /// Booked batch.
    pub batch_id: BatchId,
    /// Price in minor currency units.
    pub amount_cents: i64,
    /// Payment state reported by the processor.
    pub payment_status: PaymentStatus,
    /// Payment method, once known.
    pub payment_method: Option<PaymentMethod>,
    /// Processor reference for the payment.
    pub payment_id: Option<String>,
    /// When payment completed.
    pub paid_at: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// When the seat was taken.
    pub enrolled_at: DateTime<Utc>,
    /// When the booking was cancelled. Set once.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Reason given on cancellation.
    pub cancellation_reason: Option<String>,
    /// Refunded amount in minor currency units.
    pub refund_amount_cents: i64,
    /// When the refund was issued.
    pub refunded_at: Option<DateTime<Utc>>,
    /// Reason given for the refund.
    pub refund_reason: Option<String>,
    /// Notes from the parent to the tutor.
    pub parent_notes: Option<String>,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// When the booking was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Build a pending booking with pending payment.
    pub fn pending(input: NewBooking, now: DateTime<Utc>) -> Self {
        Self {
            id: BookingId::new(),
            parent_id: input.parent_id,
            student_id: input.student_id,
            program_id: input.program_id,
            batch_id: input.batch_id,
            amount_cents: input.amount_cents,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            payment_id: None,
            paid_at: None,
            status: BookingStatus::Pending,
            enrolled_at: now,
            cancelled_at: None,
            cancellation_reason: None,
            refund_amount_cents: 0,
            refunded_at: None,
            refund_reason: None,
            parent_notes: input.parent_notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this booking blocks another booking of the same student.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Whether this booking occupies a seat in its batch.
    pub fn holds_seat(&self) -> bool {
        self.status.holds_seat()
    }
}

/// Data required to create a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    /// Booking parent.
    pub parent_id: UserId,
    /// Student to enroll.
    pub student_id: StudentId,
    /// Program of the batch.
    pub program_id: ProgramId,
    /// Batch to enroll in.
    pub batch_id: BatchId,
    /// Price in minor currency units.
    pub amount_cents: i64,
    /// Optional notes for the tutor.
    pub parent_notes: Option<String>,
}
