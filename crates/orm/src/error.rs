//! Engine error types.
//!
//! Two fatal error classes exist: validation errors raised before any I/O,
//! and backend errors propagated unchanged from storage. Cache failures are
//! deliberately absent: the cache is an optimization, never a source of
//! truth, so cache errors are logged at their call sites and absorbed.

use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by model operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied an invalid argument. Raised synchronously, before
    /// any backend I/O.
    #[error("invalid {op} on {table}: {reason}")]
    Validation {
        /// Table of the model the operation ran against.
        table: String,
        /// Operation name.
        op: &'static str,
        /// What was wrong with the argument.
        reason: String,
    },

    /// The storage backend failed. Never retried; the underlying error is
    /// preserved as the source.
    #[error("{op} on {table} failed")]
    Backend {
        /// Table of the model the operation ran against.
        table: String,
        /// Operation name.
        op: &'static str,
        /// The backend's error.
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub(crate) fn validation(table: &str, op: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            table: table.to_string(),
            op,
            reason: reason.into(),
        }
    }

    pub(crate) fn backend(table: &str, op: &'static str, source: anyhow::Error) -> Self {
        Self::Backend {
            table: table.to_string(),
            op,
            source,
        }
    }
}
