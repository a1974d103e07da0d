//! Result type definition and extension traits.
//!
//! Provides combinators for Result types so callers can observe failures
//! without unwrap/expect/panic.

use crate::error::Error;

/// The standard Result type for Reveille operations.
///
/// # Examples
///
/// ```ignore
/// fn operation(scheduler: &AlarmScheduler, request: &AlarmRequest) -> Result<()> {
///     scheduler.schedule_exact(request)?;
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait providing safe combinators for Results.
pub trait ResultExt<T> {
    /// Convert a Result to an Option, logging the error if present.
    fn into_option_logged(self) -> Option<T>;

    /// Inspect the error without consuming the Result.
    #[must_use]
    fn inspect_error<F: FnOnce(&Error)>(self, f: F) -> Self;
}

impl<T> ResultExt<T> for Result<T> {
    fn into_option_logged(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Operation failed: {}", e);
                None
            }
        }
    }

    fn inspect_error<F: FnOnce(&Error)>(self, f: F) -> Self {
        if let Err(ref e) = self {
            f(e);
        }
        self
    }
}
