//! # enrollhub-entity
//!
//! Domain entity models for EnrollHub. Every struct in this crate
//! represents a database row or a domain value object. Entities that map
//! one-to-one onto a table additionally derive `sqlx::FromRow`.

pub mod actor;
pub mod batch;
pub mod booking;
pub mod catalog;
