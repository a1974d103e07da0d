//! Core error types for Reveille operations.
//!
//! Every failure is returned to the caller synchronously. Nothing here is
//! retried or downgraded internally.

use std::path::PathBuf;

use thiserror::Error;

/// Core error type for Reveille operations.
#[derive(Debug, Error)]
pub enum Error {
    // Request errors
    /// The alarm request is malformed and was rejected before dispatch.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    // Capability errors
    /// The dispatch or clock capability could not be reached.
    #[error("{capability} capability unavailable: {reason}")]
    DispatchUnavailable {
        capability: Capability,
        reason: String,
    },

    // Configuration errors
    #[error("failed to read file '{path}': {reason}")]
    FileReadFailed { path: PathBuf, reason: String },

    #[error("config parse error: {reason}")]
    ConfigParseFailed { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The host capability a [`Error::DispatchUnavailable`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The action-dispatch capability.
    Dispatch,
    /// The clock capability.
    Clock,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dispatch => write!(f, "dispatch"),
            Self::Clock => write!(f, "clock"),
        }
    }
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create an error for an unreachable dispatch capability.
    pub fn dispatch_unavailable(reason: impl Into<String>) -> Self {
        Self::DispatchUnavailable {
            capability: Capability::Dispatch,
            reason: reason.into(),
        }
    }

    /// Create an error for an unreachable clock capability.
    pub fn clock_unavailable(reason: impl Into<String>) -> Self {
        Self::DispatchUnavailable {
            capability: Capability::Clock,
            reason: reason.into(),
        }
    }

    /// Create a file read error.
    pub fn file_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a config parse error.
    pub fn config_parse_failed(reason: impl Into<String>) -> Self {
        Self::ConfigParseFailed {
            reason: reason.into(),
        }
    }

    /// Whether this error rejected a malformed request.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Whether this error reports an unreachable capability.
    #[must_use]
    pub const fn is_dispatch_unavailable(&self) -> bool {
        matches!(self, Self::DispatchUnavailable { .. })
    }
}
