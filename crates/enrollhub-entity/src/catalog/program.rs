//! Program entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use enrollhub_core::types::{ProgramId, UserId};

/// A tutor-authored course offering.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Program {
    /// Unique program identifier.
    pub id: ProgramId,
    /// Tutor who owns the program.
    pub tutor_id: UserId,
    /// Program title.
    pub title: String,
    /// When the program was registered.
    pub created_at: DateTime<Utc>,
}

impl Program {
    /// Whether `user` is the owning tutor.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.tutor_id == user
    }
}
