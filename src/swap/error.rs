//! Error taxonomy for the swap core
//!
//! Every variant except `Store` is a business-rule violation reported
//! synchronously to the caller and never retried. `Store` wraps an
//! infrastructure failure from the backing store; callers may retry those.

use crate::swap::models::SwapStatus;

/// Outcome of a failed core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    /// Referenced swap or user id does not exist.
    NotFound(&'static str),
    /// Actor lacks permission for the requested transition or rating slot.
    Forbidden(String),
    /// Operation attempted from the wrong lifecycle state.
    InvalidState {
        required: SwapStatus,
        actual: SwapStatus,
    },
    /// Duplicate pending swap, or a second write to a rating slot.
    Conflict(String),
    /// Malformed input: missing skill fields, rating out of range, empty comment.
    Validation(String),
    /// Storage-layer failure. Not a business-rule violation.
    Store(String),
}

impl std::fmt::Display for SwapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwapError::NotFound(what) => write!(f, "{} not found", what),
            SwapError::Forbidden(reason) => write!(f, "not authorized: {}", reason),
            SwapError::InvalidState { required, actual } => {
                write!(f, "swap is {}, operation requires {}", actual, required)
            }
            SwapError::Conflict(reason) => write!(f, "{}", reason),
            SwapError::Validation(reason) => write!(f, "{}", reason),
            SwapError::Store(reason) => write!(f, "storage failure: {}", reason),
        }
    }
}

impl std::error::Error for SwapError {}

impl From<crate::store::StoreError> for SwapError {
    fn from(err: crate::store::StoreError) -> Self {
        SwapError::Store(err.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_distinguishes_kinds() {
        let invalid = SwapError::InvalidState {
            required: SwapStatus::Accepted,
            actual: SwapStatus::Pending,
        };
        assert_eq!(
            invalid.to_string(),
            "swap is pending, operation requires accepted"
        );
        assert_eq!(SwapError::NotFound("swap").to_string(), "swap not found");
    }
}
