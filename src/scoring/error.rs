//! Scoring Errors
//!
//! Every engine operation either applies its whole transition or returns one of
//! these and leaves the match untouched.

use serde::{Deserialize, Serialize};

/// Broad category of a rejected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Match or innings reference does not resolve.
    NotFound,
    /// Operation attempted outside its lifecycle state.
    InvalidState,
    /// A cricket sequencing rule is broken.
    RuleViolation,
    /// Malformed input.
    Validation,
    /// Write raced with another write (stale version).
    Conflict,
}

/// Scoring engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    /// Match not found.
    #[error("Match not found")]
    NotFound,

    /// Invalid lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Cricket rule violation.
    #[error("Rule violation: {0}")]
    RuleViolation(String),

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Expected version did not match.
    #[error("Version conflict: expected {expected}, actual {actual}")]
    VersionConflict {
        /// Version the caller read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },
}

impl ScoringError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScoringError::NotFound => ErrorKind::NotFound,
            ScoringError::InvalidState(_) => ErrorKind::InvalidState,
            ScoringError::RuleViolation(_) => ErrorKind::RuleViolation,
            ScoringError::Validation(_) => ErrorKind::Validation,
            ScoringError::VersionConflict { .. } => ErrorKind::Conflict,
        }
    }

    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        ScoringError::InvalidState(msg.into())
    }

    pub(crate) fn rule(msg: impl Into<String>) -> Self {
        ScoringError::RuleViolation(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        ScoringError::Validation(msg.into())
    }
}

/// Result alias for engine operations.
pub type ScoringResult<T> = Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ScoringError::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(ScoringError::rule("x").kind(), ErrorKind::RuleViolation);
        assert_eq!(
            ScoringError::VersionConflict { expected: 1, actual: 2 }.kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_error_display() {
        let err = ScoringError::rule("bowler cannot bowl consecutive overs");
        assert_eq!(err.to_string(), "Rule violation: bowler cannot bowl consecutive overs");
    }
}
