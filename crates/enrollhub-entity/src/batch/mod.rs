//! Batch entity: a scheduled, capacity-limited offering of a program.

pub mod model;
pub mod schedule;
pub mod status;

pub use model::{Batch, CreateBatch, Enrollment};
pub use schedule::Weekday;
pub use status::BatchStatus;
