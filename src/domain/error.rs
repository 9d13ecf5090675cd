//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent outline rule violations.
/// These are independent of storage and presentation concerns.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid node path: {0}")]
    InvalidPath(String),

    #[error("outline nesting exceeds {limit} levels")]
    DepthLimitExceeded { limit: usize },

    #[error("unknown lesson type: {0}")]
    UnknownLessonType(String),

    #[error("invalid attachment '{0}', expected name=url")]
    InvalidAttachment(String),
}
