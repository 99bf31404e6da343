//! Database error definitions.

use thiserror::Error;

use crate::resilience::classify::{Classify, FailureKind};

/// Server error code reported for unique index violations.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Errors that can occur while talking to the database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// No database URI was configured.
    #[error("database not configured")]
    NotConfigured,

    /// The configured URI could not be used.
    #[error("invalid database URI: {0}")]
    InvalidUri(String),

    /// Could not reach the server.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The server did not answer in time.
    #[error("database timeout after {0} ms")]
    Timeout(u64),

    /// Server-side error with a numeric code.
    #[error("server error {code}: {message}")]
    Server { code: i32, message: String },

    /// Document failed schema validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A value could not be cast to the field type.
    #[error("cast to {target} failed for value {value:?}")]
    Cast { target: String, value: String },

    /// Credentials missing, invalid or expired.
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl Classify for DatabaseError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            DatabaseError::Timeout(_) => FailureKind::Timeout,
            DatabaseError::Connection(e) => e.failure_kind(),
            DatabaseError::Server { code, .. } if *code == DUPLICATE_KEY_CODE => FailureKind::DuplicateKey,
            DatabaseError::Validation(_) | DatabaseError::InvalidUri(_) => FailureKind::Validation,
            DatabaseError::Cast { .. } => FailureKind::Cast,
            DatabaseError::Unauthorized(_) | DatabaseError::Forbidden(_) => FailureKind::Auth,
            DatabaseError::NotFound(_) => FailureKind::NotFound,
            DatabaseError::NotConfigured | DatabaseError::Server { .. } => FailureKind::Unclassified,
        }
    }
}

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
