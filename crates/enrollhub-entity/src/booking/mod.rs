//! Booking entity: one parent's enrollment of one student in one batch.

pub mod model;
pub mod payment;
pub mod status;

pub use model::{Booking, NewBooking};
pub use payment::{PaymentMethod, PaymentStatus};
pub use status::BookingStatus;
