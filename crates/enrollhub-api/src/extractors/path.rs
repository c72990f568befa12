//! Typed path parameter helpers.

use std::str::FromStr;

use enrollhub_core::error::AppError;

use crate::error::ApiError;

/// Parses a typed identifier from a path segment.
pub fn parse_id<T: FromStr>(s: &str) -> Result<T, ApiError> {
    s.parse::<T>()
        .map_err(|_| AppError::validation(format!("Invalid UUID: {s}")).into())
}
