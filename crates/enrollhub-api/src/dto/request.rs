//! Request DTOs with validation.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use enrollhub_entity::batch::{BatchStatus, CreateBatch, Weekday};
use enrollhub_entity::booking::{BookingStatus, PaymentMethod, PaymentStatus};
use enrollhub_service::{
    CreateBookingRequest, ListBookingsQuery, PaymentEvent, RegisterProgramRequest,
    RegisterStudentRequest, UpdateBatchRequest,
};

/// Create booking request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookingBody {
    /// Student to enroll.
    pub student_id: Uuid,
    /// Program the batch belongs to.
    pub program_id: Uuid,
    /// Batch to enroll in.
    pub batch_id: Uuid,
    /// Price in minor units.
    #[validate(range(min = 0, message = "Amount cannot be negative"))]
    pub amount_cents: i64,
    /// Notes for the tutor.
    #[validate(length(max = 1000))]
    pub parent_notes: Option<String>,
}

impl From<CreateBookingBody> for CreateBookingRequest {
    fn from(body: CreateBookingBody) -> Self {
        Self {
            student_id: body.student_id.into(),
            program_id: body.program_id.into(),
            batch_id: body.batch_id.into(),
            amount_cents: body.amount_cents,
            parent_notes: body.parent_notes,
        }
    }
}

/// Cancel booking request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CancelBookingBody {
    /// Why the booking is cancelled.
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Status change request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusBody {
    /// Target status.
    pub status: BookingStatus,
}

/// Payment event body sent by the payment processor.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordPaymentBody {
    /// New payment status.
    pub status: PaymentStatus,
    /// Processor reference.
    #[validate(length(min = 1, max = 255))]
    pub payment_id: Option<String>,
    /// Method used.
    pub payment_method: Option<PaymentMethod>,
    /// Refunded amount in minor units.
    #[validate(range(min = 0))]
    pub refund_amount_cents: Option<i64>,
    /// Refund reason.
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

impl From<RecordPaymentBody> for PaymentEvent {
    fn from(body: RecordPaymentBody) -> Self {
        Self {
            status: body.status,
            payment_id: body.payment_id,
            payment_method: body.payment_method,
            refund_amount_cents: body.refund_amount_cents,
            reason: body.reason,
        }
    }
}

/// Booking list filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBookingsParams {
    /// Only bookings in this status.
    pub status: Option<BookingStatus>,
    /// Only bookings for this batch.
    pub batch_id: Option<Uuid>,
}

impl From<ListBookingsParams> for ListBookingsQuery {
    fn from(params: ListBookingsParams) -> Self {
        Self {
            status: params.status,
            batch_id: params.batch_id.map(Into::into),
        }
    }
}

/// Create batch request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBatchBody {
    /// Owning program.
    pub program_id: Uuid,
    /// Display name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Meeting days.
    #[validate(length(min = 1, message = "At least one meeting day is required"))]
    pub days: Vec<Weekday>,
    /// Session start.
    pub start_time: NaiveTime,
    /// Session end.
    pub end_time: NaiveTime,
    /// Seat ceiling.
    #[validate(range(min = 1, message = "max_students must be at least 1"))]
    pub max_students: i32,
}

impl From<CreateBatchBody> for CreateBatch {
    fn from(body: CreateBatchBody) -> Self {
        Self {
            program_id: body.program_id.into(),
            name: body.name,
            start_date: body.start_date,
            end_date: body.end_date,
            days: body.days,
            start_time: body.start_time,
            end_time: body.end_time,
            max_students: body.max_students,
        }
    }
}

/// Partial batch update body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateBatchBody {
    /// New name.
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// New first day.
    pub start_date: Option<NaiveDate>,
    /// New last day.
    pub end_date: Option<NaiveDate>,
    /// New meeting days.
    #[validate(length(min = 1))]
    pub days: Option<Vec<Weekday>>,
    /// New session start.
    pub start_time: Option<NaiveTime>,
    /// New session end.
    pub end_time: Option<NaiveTime>,
    /// New seat ceiling.
    #[validate(range(min = 1))]
    pub max_students: Option<i32>,
    /// New status.
    pub status: Option<BatchStatus>,
}

impl From<UpdateBatchBody> for UpdateBatchRequest {
    fn from(body: UpdateBatchBody) -> Self {
        Self {
            name: body.name,
            start_date: body.start_date,
            end_date: body.end_date,
            days: body.days,
            start_time: body.start_time,
            end_time: body.end_time,
            max_students: body.max_students,
            status: body.status,
        }
    }
}

/// Register student request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterStudentBody {
    /// Given name.
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    /// Family name.
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
}

impl From<RegisterStudentBody> for RegisterStudentRequest {
    fn from(body: RegisterStudentBody) -> Self {
        Self {
            first_name: body.first_name,
            last_name: body.last_name,
        }
    }
}

/// Register program request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterProgramBody {
    /// Program title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
}

impl From<RegisterProgramBody> for RegisterProgramRequest {
    fn from(body: RegisterProgramBody) -> Self {
        Self { title: body.title }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_amount_fails_validation() {
        let body = CreateBookingBody {
            student_id: Uuid::now_v7(),
            program_id: Uuid::now_v7(),
            batch_id: Uuid::now_v7(),
            amount_cents: -1,
            parent_notes: None,
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_batch_without_days_fails_validation() {
        let body = CreateBatchBody {
            program_id: Uuid::now_v7(),
            name: "Evening".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            days: vec![],
            start_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            max_students: 5,
        };
        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("days"));
    }

    #[test]
    fn test_empty_update_is_valid() {
        assert!(UpdateBatchBody::default().validate().is_ok());
    }
}
