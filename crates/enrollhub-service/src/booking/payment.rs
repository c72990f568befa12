//! Payment events reported by the payment processor.
//!
//! Payment state never moves a seat. The only coupling to the booking
//! lifecycle is optional auto-confirmation of a pending booking once its
//! payment completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use enrollhub_core::error::AppError;
use enrollhub_core::result::AppResult;
use enrollhub_core::types::BookingId;
use enrollhub_database::store::BookingState;
use enrollhub_entity::actor::ActorRole;
use enrollhub_entity::booking::{Booking, BookingStatus, PaymentMethod, PaymentStatus};

use super::service::BookingService;
use super::should_retry;
use crate::access;
use crate::context::RequestContext;

/// A payment status change reported for a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// New payment status.
    pub status: PaymentStatus,
    /// Processor reference.
    #[serde(default)]
    pub payment_id: Option<String>,
    /// Method used.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// Refunded amount; defaults to the full amount.
    #[serde(default)]
    pub refund_amount_cents: Option<i64>,
    /// Refund reason.
    #[serde(default)]
    pub reason: Option<String>,
}

impl BookingService {
    /// Apply a payment event to a booking.
    pub async fn record_payment(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
        event: PaymentEvent,
    ) -> AppResult<Booking> {
        access::require_role(
            ctx,
            &[ActorRole::System, ActorRole::Admin],
            "record payments",
        )?;
        let booking = self.find(booking_id).await?;

        let guard = self
            .locks
            .acquire_existing(self.store.as_ref(), booking.batch_id)
            .await?;
        let result = self.payment_locked(booking_id, &event).await;
        if let Some(guard) = guard {
            self.locks
                .release(self.store.as_ref(), booking.batch_id, guard)
                .await;
        }
        let updated = result?;

        info!(
            booking_id = %booking_id,
            payment_status = %updated.payment_status,
            status = %updated.status,
            "Payment recorded"
        );
        Ok(updated)
    }

    async fn payment_locked(&self, booking_id: BookingId, event: &PaymentEvent) -> AppResult<Booking> {
        let mut attempt = 0;
        loop {
            let current = self.find(booking_id).await?;
            let expected = BookingState::of(&current);
            let updated = apply_payment(current, event, self.config.confirm_on_payment, Utc::now())?;
            match self.store.update_booking(&updated, expected).await {
                Ok(()) => return Ok(updated),
                Err(e) if should_retry(&e, attempt, self.config.max_commit_retries) => {
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Apply `event` to `booking`, validating the payment transition.
pub(crate) fn apply_payment(
    mut booking: Booking,
    event: &PaymentEvent,
    confirm_on_payment: bool,
    now: DateTime<Utc>,
) -> AppResult<Booking> {
    if !booking.payment_status.can_transition_to(event.status) {
        return Err(AppError::invalid_transition(format!(
            "Cannot move payment from {} to {}",
            booking.payment_status, event.status
        )));
    }

    if let Some(method) = event.payment_method {
        booking.payment_method = Some(method);
    }

    match event.status {
        PaymentStatus::Completed => {
            booking.paid_at = Some(now);
            if event.payment_id.is_some() {
                booking.payment_id = event.payment_id.clone();
            }
            if confirm_on_payment && booking.status == BookingStatus::Pending {
                booking.status = BookingStatus::Confirmed;
            }
        }
        PaymentStatus::Refunded => {
            let amount = event.refund_amount_cents.unwrap_or(booking.amount_cents);
            if amount < 0 || amount > booking.amount_cents {
                return Err(AppError::validation(format!(
                    "Refund of {amount} must be between 0 and the booking amount {}",
                    booking.amount_cents
                )));
            }
            booking.refund_amount_cents = amount;
            booking.refunded_at = Some(now);
            booking.refund_reason = event.reason.clone();
        }
        PaymentStatus::Pending | PaymentStatus::Failed => {}
    }

    booking.payment_status = event.status;
    booking.updated_at = now;
    Ok(booking)
}
