//! Action-dispatch capability.
//!
//! The host owns the pending-alarm table. Implementations must keep at most
//! one pending alarm per `(id, action)` key: a registration under an existing
//! key replaces it, and cancelling a missing key is a silent no-op.

use reveille_core::{ActionRef, AlarmId, Result};
use serde::{Deserialize, Serialize};

/// Delivery precision requested for a one-shot alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exactness {
    /// The host must not batch or delay delivery.
    Exact,
    /// The host may coalesce or delay delivery to save power.
    Inexact,
}

impl Exactness {
    /// Check if this is exact delivery.
    #[must_use]
    pub const fn is_exact(self) -> bool {
        matches!(self, Self::Exact)
    }
}

impl std::fmt::Display for Exactness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Inexact => write!(f, "inexact"),
        }
    }
}

/// Host capability that registers and cancels alarms.
///
/// Every method is a single call to the host. A host that is not reachable
/// returns [`reveille_core::Error::DispatchUnavailable`] and leaves its table
/// untouched.
pub trait AlarmDispatch: Send + Sync {
    /// Register an alarm that fires once at `os_trigger_millis`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unreachable.
    fn register_one_shot(
        &self,
        id: AlarmId,
        os_trigger_millis: i64,
        exactness: Exactness,
        action: &ActionRef,
    ) -> Result<()>;

    /// Register an alarm that fires at `first_os_trigger_millis` and then
    /// every `interval_millis`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unreachable.
    fn register_repeating(
        &self,
        id: AlarmId,
        first_os_trigger_millis: i64,
        interval_millis: i64,
        action: &ActionRef,
    ) -> Result<()>;

    /// Cancel the pending alarm for `(id, action)`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unreachable.
    fn cancel(&self, id: AlarmId, action: &ActionRef) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactness_display() {
        assert_eq!(Exactness::Exact.to_string(), "exact");
        assert_eq!(Exactness::Inexact.to_string(), "inexact");
        assert!(Exactness::Exact.is_exact());
        assert!(!Exactness::Inexact.is_exact());
    }
}
