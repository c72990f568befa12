//! # enrollhub-service
//!
//! Business logic for EnrollHub. Services take their dependencies at
//! construction time as `Arc` references and receive the acting user as
//! an explicit [`RequestContext`] on every call.
//!
//! All seat accounting flows through the [`capacity`] module and is
//! committed under the per-batch lock held by [`BatchLocks`].

pub mod access;
pub mod availability;
pub mod batch;
pub mod booking;
pub mod capacity;
pub mod catalog;
pub mod context;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod testing;

pub use availability::{
    AvailabilityService, BatchAvailability, BatchDetail, ProgramAvailability, RosterEntry,
};
pub use batch::{BatchService, UpdateBatchRequest};
pub use booking::{
    BookingService, CreateBookingRequest, ListBookingsQuery, PaymentEvent,
};
pub use capacity::BatchLocks;
pub use catalog::{CatalogService, RegisterProgramRequest, RegisterStudentRequest};
pub use context::RequestContext;
pub use reconcile::{BatchDrift, EnrollmentReconciler, ReconcileReport};
