//! Advisory seat availability. Nothing here reserves a seat.

pub mod service;

pub use service::{
    AvailabilityService, BatchAvailability, BatchDetail, ProgramAvailability, RosterEntry,
    batch_is_open,
};
