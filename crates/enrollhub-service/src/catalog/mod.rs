//! Students and programs.

pub mod service;

pub use service::{CatalogService, RegisterProgramRequest, RegisterStudentRequest};
