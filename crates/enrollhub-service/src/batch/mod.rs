//! Batch administration: create, edit, delete.

pub mod service;

pub use service::{BatchService, UpdateBatchRequest};
