//! Booking status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use enrollhub_core::AppError;

/// Primary status of a booking.
///
/// ```text
/// pending -> confirmed -> active -> completed
///    \___________\___________\____-> cancelled
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Seat held, awaiting confirmation.
    #[default]
    Pending,
    /// Confirmed by the tutor or by payment.
    Confirmed,
    /// The student is attending.
    Active,
    /// The batch finished for this student.
    Completed,
    /// Withdrawn; the seat was released.
    Cancelled,
}

impl BookingStatus {
    /// Active bookings count against the duplicate guard.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Active)
    }

    /// Whether a booking in this state occupies a roster seat.
    ///
    /// Completion keeps the seat; only cancellation gives it back.
    pub fn holds_seat(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Check if the booking is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        match next {
            Self::Cancelled => self.is_active(),
            _ => self.successor() == Some(next),
        }
    }

    /// The next forward state, if any.
    pub fn successor(&self) -> Option<BookingStatus> {
        match self {
            Self::Pending => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Active),
            Self::Active => Some(Self::Completed),
            Self::Completed | Self::Cancelled => None,
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// All statuses that count as active.
    pub const ACTIVE: [BookingStatus; 3] = [Self::Pending, Self::Confirmed, Self::Active];
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::validation(format!("Invalid booking status: {s}"))),
        }
    }
}
