//! Student entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use enrollhub_core::types::{StudentId, UserId};

/// A parent's child who can be enrolled in batches.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    /// Unique student identifier.
    pub id: StudentId,
    /// Parent the student belongs to.
    pub parent_id: UserId,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// When the student was registered.
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// Whether `user` is this student's parent.
    pub fn belongs_to(&self, user: UserId) -> bool {
        self.parent_id == user
    }
}
