//! Alarm requests submitted by callers.

use chrono::{DateTime, Utc};
use reveille_core::{ActionRef, AlarmId, Error, Result};
use serde::{Deserialize, Serialize};

use crate::dispatch::Exactness;
use crate::translator::target_from_epoch_millis;

/// How an alarm is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmMode {
    /// Fire once, without batching.
    Exact,
    /// Fire once; the host may delay delivery.
    Inexact,
    /// Fire at the target and then every interval.
    Repeating,
}

impl AlarmMode {
    /// Check if the mode repeats.
    #[must_use]
    pub const fn is_repeating(self) -> bool {
        matches!(self, Self::Repeating)
    }

    /// Precision tag for one-shot modes.
    #[must_use]
    pub const fn exactness(self) -> Option<Exactness> {
        match self {
            Self::Exact => Some(Exactness::Exact),
            Self::Inexact => Some(Exactness::Inexact),
            Self::Repeating => None,
        }
    }
}

impl std::fmt::Display for AlarmMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Inexact => write!(f, "inexact"),
            Self::Repeating => write!(f, "repeating"),
        }
    }
}

/// A request to fire `action` at `target_time`.
///
/// Fields are public so requests can be built from any source; the scheduler
/// validates every request before it touches the dispatch capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRequest {
    /// Dedup and cancellation key.
    pub id: AlarmId,
    /// Desired wall-clock instant on the caller's clock.
    pub target_time: DateTime<Utc>,
    /// Delivery mode.
    pub mode: AlarmMode,
    /// Repeat interval; present iff `mode` is [`AlarmMode::Repeating`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_millis: Option<i64>,
    /// Action the host invokes.
    pub action: ActionRef,
}

impl AlarmRequest {
    /// Create an exact one-shot request.
    #[must_use]
    pub const fn exact(id: AlarmId, target_time: DateTime<Utc>, action: ActionRef) -> Self {
        Self {
            id,
            target_time,
            mode: AlarmMode::Exact,
            interval_millis: None,
            action,
        }
    }

    /// Create an inexact one-shot request.
    #[must_use]
    pub const fn inexact(id: AlarmId, target_time: DateTime<Utc>, action: ActionRef) -> Self {
        Self {
            id,
            target_time,
            mode: AlarmMode::Inexact,
            interval_millis: None,
            action,
        }
    }

    /// Create a repeating request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `interval_millis` is not positive.
    pub fn repeating(
        id: AlarmId,
        target_time: DateTime<Utc>,
        interval_millis: i64,
        action: ActionRef,
    ) -> Result<Self> {
        let request = Self {
            id,
            target_time,
            mode: AlarmMode::Repeating,
            interval_millis: Some(interval_millis),
            action,
        };
        request.validate()?;
        Ok(request)
    }

    /// Replace the target with an instant given in epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the instant is unrepresentable.
    pub fn at_epoch_millis(mut self, epoch_millis: i64) -> Result<Self> {
        self.target_time = target_from_epoch_millis(epoch_millis)?;
        Ok(self)
    }

    /// Target as epoch milliseconds.
    #[must_use]
    pub fn target_epoch_millis(&self) -> i64 {
        self.target_time.timestamp_millis()
    }

    /// Check the mode/interval invariant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a repeating request lacks a positive
    /// interval, or a one-shot request carries one.
    pub fn validate(&self) -> Result<()> {
        match (self.mode, self.interval_millis) {
            (AlarmMode::Repeating, Some(interval)) if interval > 0 => Ok(()),
            (AlarmMode::Repeating, Some(interval)) => Err(Error::invalid_input(format!(
                "alarm {}: repeat interval must be positive, got {interval}ms",
                self.id
            ))),
            (AlarmMode::Repeating, None) => Err(Error::invalid_input(format!(
                "alarm {}: repeating mode requires an interval",
                self.id
            ))),
            (mode, Some(interval)) => Err(Error::invalid_input(format!(
                "alarm {}: {mode} mode must not carry an interval ({interval}ms)",
                self.id
            ))),
            (_, None) => Ok(()),
        }
    }
}
