//! Booking lifecycle: create, cancel, status transitions, payments, reads.

pub mod payment;
pub mod service;

#[cfg(test)]
mod sequences;

pub use payment::PaymentEvent;
pub use service::{BookingService, CreateBookingRequest, ListBookingsQuery};

use enrollhub_core::error::{AppError, ErrorKind};

/// Whether a failed commit should be re-run from a fresh read.
pub(crate) fn should_retry(err: &AppError, attempt: u32, max_retries: u32) -> bool {
    err.kind == ErrorKind::Conflict && attempt < max_retries
}
