//! Error types for the quarry store.
//!
//! A single [`StoreError`] enum covers the whole API surface. Each variant
//! maps onto one of five stable [`ErrorCode`]s:
//!
//! | Code | Meaning |
//! |------|---------|
//! | InvalidTransaction | wrong store, wrong mode |
//! | NotFound | missing path or policy |
//! | Internal | partition overlap, schema mismatch, encoding failure |
//! | Cancelled | caller context cancelled during a long scan |
//! | Engine | underlying key-value engine error (source preserved) |
//!
//! Errors inside a transaction leave it abortable; they are never recovered
//! automatically. Trigger callback errors are logged by the dispatcher and
//! do not affect the commit they follow.

use std::fmt;
use thiserror::Error;

/// Result type alias used throughout the store.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Stable classification of [`StoreError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Transaction belongs to another store or has the wrong mode.
    InvalidTransaction,
    /// Path or policy does not exist.
    NotFound,
    /// Invariant violation, incompatible configuration, or encoding failure.
    Internal,
    /// The caller context was cancelled mid-operation.
    Cancelled,
    /// Failure reported by the underlying key-value engine.
    Engine,
}

impl ErrorCode {
    /// Canonical string form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidTransaction => "invalid_transaction",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Internal => "internal",
            ErrorCode::Cancelled => "cancelled",
            ErrorCode::Engine => "engine",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for all store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The transaction cannot be used for this operation.
    #[error("invalid transaction: {message}")]
    InvalidTransaction {
        /// Why the transaction was rejected.
        message: String,
    },

    /// The referenced path or policy does not exist.
    #[error("not found: {target}")]
    NotFound {
        /// Display form of the missing path or policy id.
        target: String,
    },

    /// Invariant violation or incompatible configuration.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the violation.
        message: String,
    },

    /// The caller context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// Error surfaced verbatim from the underlying key-value engine.
    #[error("storage engine: {source}")]
    Engine {
        /// The engine's own error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    /// Create an `InvalidTransaction` error.
    pub fn invalid_transaction(message: impl Into<String>) -> Self {
        StoreError::InvalidTransaction {
            message: message.into(),
        }
    }

    /// Create a `NotFound` error for a path or policy id.
    pub fn not_found(target: impl fmt::Display) -> Self {
        StoreError::NotFound {
            target: target.to_string(),
        }
    }

    /// Create an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal {
            message: message.into(),
        }
    }

    /// Wrap an engine error, preserving it as the source.
    pub fn engine(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError::Engine {
            source: source.into(),
        }
    }

    /// Classify this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::InvalidTransaction { .. } => ErrorCode::InvalidTransaction,
            StoreError::NotFound { .. } => ErrorCode::NotFound,
            StoreError::Internal { .. } => ErrorCode::Internal,
            StoreError::Cancelled => ErrorCode::Cancelled,
            StoreError::Engine { .. } => ErrorCode::Engine,
        }
    }

    /// True for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// True for `InvalidTransaction`.
    pub fn is_invalid_transaction(&self) -> bool {
        matches!(self, StoreError::InvalidTransaction { .. })
    }

    /// True for `Cancelled`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled)
    }

    /// True for `Internal`.
    pub fn is_internal(&self) -> bool {
        matches!(self, StoreError::Internal { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::internal(format!("value encoding: {err}"))
    }
}
