//! Actor role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles an authenticated caller can act under.
///
/// Roles are resolved upstream and passed in explicitly with every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    /// Books seats for their own students.
    Parent,
    /// Owns programs and manages their batches and bookings.
    Tutor,
    /// Full platform administrator.
    Admin,
    /// Trusted internal collaborator (the payment processor).
    System,
}

impl ActorRole {
    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Tutor => "tutor",
            Self::Admin => "admin",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = enrollhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parent" => Ok(Self::Parent),
            "tutor" => Ok(Self::Tutor),
            "admin" => Ok(Self::Admin),
            "system" => Ok(Self::System),
            _ => Err(enrollhub_core::AppError::validation(format!(
                "Invalid actor role: '{s}'. Expected one of: parent, tutor, admin, system"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("parent".parse::<ActorRole>().unwrap(), ActorRole::Parent);
        assert_eq!("ADMIN".parse::<ActorRole>().unwrap(), ActorRole::Admin);
        assert!("viewer".parse::<ActorRole>().is_err());
    }
}
