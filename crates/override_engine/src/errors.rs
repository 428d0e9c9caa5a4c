//! Override engine error types.
//!
//! Domain-specific errors for rule construction and resolution queries.

use thiserror::Error;

/// Override engine errors.
///
/// Resolution itself is infallible once a rule snapshot has been built. These
/// errors come from constructing rules, time windows and snapshots, and from
/// out-of-range query arguments.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid rule: {field} - {reason}")]
    InvalidRule { field: String, reason: String },

    #[error("Minute of day out of range: {minute} (expected 0..1440)")]
    InvalidMinute { minute: u32 },
}

impl EngineError {
    /// Shorthand for building an [`EngineError::InvalidRule`].
    pub fn invalid_rule(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidRule {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for override engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
