//! Route handlers organized by domain.

pub mod admin;
pub mod batch;
pub mod booking;
pub mod catalog;
pub mod health;
