//! Error types for serialized-aware replacement.
//!
//! Malformed serialized markers are never errors: the scanner treats them as
//! ordinary bytes. Only boundary validation and allocation failures surface
//! through this module.

use std::collections::TryReserveError;
use std::fmt;
use thiserror::Error;

/// The main error type for the replacement engines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ReplaceError {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about what was being processed.
    pub context: Option<String>,
}

impl fmt::Display for ReplaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(ref ctx) = self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

/// Specific kinds of replacement errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An input had the wrong shape or type.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The output buffer could not be grown.
    #[error("failed to allocate {requested} additional bytes for output")]
    AllocationFailure {
        /// Number of additional bytes that were requested.
        requested: usize,
    },
}

impl ReplaceError {
    /// Create a new error with the given kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Shorthand for an [`ErrorKind::InvalidArgument`] error.
    #[cold]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }

    /// Shorthand for an [`ErrorKind::AllocationFailure`] error.
    #[cold]
    pub fn allocation_failure(requested: usize) -> Self {
        Self::new(ErrorKind::AllocationFailure { requested })
    }

    /// Add context to the error.
    #[inline]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Whether this error came from boundary validation.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidArgument(_))
    }
}

/// Result type alias for the replacement engines.
pub type Result<T> = std::result::Result<T, ReplaceError>;

/// Map a failed `try_reserve` into an allocation error carrying the request size.
pub(crate) fn reserve_error(requested: usize, _source: TryReserveError) -> ReplaceError {
    ReplaceError::allocation_failure(requested)
}
