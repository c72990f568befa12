//! Batch scheduling status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use enrollhub_core::AppError;

/// Scheduling status of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "batch_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Scheduled, not yet started.
    #[default]
    Upcoming,
    /// Currently running.
    Active,
    /// Finished.
    Completed,
    /// Called off.
    Cancelled,
}

impl BatchStatus {
    /// Whether new enrollments may be taken in this status.
    pub fn accepts_enrollment(&self) -> bool {
        matches!(self, Self::Upcoming | Self::Active)
    }

    /// Check if the batch is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a batch may move from `self` to `next`.
    ///
    /// Setting the current status again is allowed so that edits which
    /// resend an unchanged status are not rejected.
    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::Upcoming, Self::Active)
                | (Self::Upcoming, Self::Cancelled)
                | (Self::Active, Self::Completed)
                | (Self::Active, Self::Cancelled)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(Self::Upcoming),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::validation(format!("Invalid batch status: {s}"))),
        }
    }
}
