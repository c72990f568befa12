//! Minimal catalog records referenced by bookings.
//!
//! Full program and student management lives outside this system; only
//! the ownership fields needed for authorization are modelled here.

pub mod program;
pub mod student;

pub use program::Program;
pub use student::Student;
