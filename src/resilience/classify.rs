//! Failure classification.
//!
//! # Responsibilities
//! - Map any operation error onto the closed `FailureKind` taxonomy
//! - Decide whether a failure is worth retrying
//!
//! # Design Decisions
//! - Errors opt in through the `Classify` trait; the mapping is total
//! - Request-side faults (validation, auth, missing or duplicate data) are terminal
//! - Anything unrecognized is treated as a transient dependency fault

use std::fmt;

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The attempt did not complete within its deadline.
    Timeout,
    /// The request payload was rejected by the dependency.
    Validation,
    /// A value could not be converted to the expected type.
    Cast,
    /// Invalid, expired or insufficient credentials.
    Auth,
    /// The requested record does not exist.
    NotFound,
    /// A unique constraint was violated.
    DuplicateKey,
    /// Any other failure.
    Unclassified,
}

impl FailureKind {
    /// Whether another attempt could change the outcome.
    pub fn is_retryable(self) -> bool {
        !matches!(
            self,
            FailureKind::Validation
                | FailureKind::Cast
                | FailureKind::Auth
                | FailureKind::NotFound
                | FailureKind::DuplicateKey
        )
    }

    /// Stable label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Validation => "validation",
            FailureKind::Cast => "cast",
            FailureKind::Auth => "auth",
            FailureKind::NotFound => "not_found",
            FailureKind::DuplicateKey => "duplicate_key",
            FailureKind::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can be placed in the failure taxonomy.
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;
}

impl Classify for FailureKind {
    fn failure_kind(&self) -> FailureKind {
        *self
    }
}

impl Classify for std::io::Error {
    fn failure_kind(&self) -> FailureKind {
        match self.kind() {
            std::io::ErrorKind::TimedOut => FailureKind::Timeout,
            std::io::ErrorKind::NotFound => FailureKind::NotFound,
            std::io::ErrorKind::PermissionDenied => FailureKind::Auth,
            std::io::ErrorKind::InvalidInput | std::io::ErrorKind::InvalidData => {
                FailureKind::Validation
            }
            _ => FailureKind::Unclassified,
        }
    }
}

impl<T: Classify + ?Sized> Classify for &T {
    fn failure_kind(&self) -> FailureKind {
        (**self).failure_kind()
    }
}

impl<T: Classify + ?Sized> Classify for Box<T> {
    fn failure_kind(&self) -> FailureKind {
        (**self).failure_kind()
    }
}

/// Result of classifying a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: FailureKind,
    pub retryable: bool,
}

/// Classify an error and decide whether it may be retried.
pub fn classify<E: Classify + ?Sized>(error: &E) -> Classification {
    let kind = error.failure_kind();
    Classification {
        kind,
        retryable: kind.is_retryable(),
    }
}
