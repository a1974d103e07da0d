//! Clock skew translation.
//!
//! The caller and the host may disagree on the absolute epoch value (per
//! process clock bases, drift). Only the delay from "now" is carried across:
//!
//! ```text
//! os_trigger = os_now + (target - caller_now)
//! ```
//!
//! Past targets produce a trigger at or before `os_now`. They are passed on
//! unchanged; the host fires past-due alarms immediately.

use chrono::{DateTime, Utc};
use reveille_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Trigger time expressed on the host clock.
///
/// Computed per submission and never cached, since skew drifts between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TranslatedTrigger {
    os_trigger_millis: i64,
}

impl TranslatedTrigger {
    /// Get the trigger on the host clock.
    #[must_use]
    pub const fn os_trigger_millis(self) -> i64 {
        self.os_trigger_millis
    }

    /// Milliseconds from `os_now_millis` until the trigger (negative if due).
    #[must_use]
    pub const fn delay_from(self, os_now_millis: i64) -> i64 {
        self.os_trigger_millis.saturating_sub(os_now_millis)
    }

    /// Whether the host should fire this trigger immediately.
    #[must_use]
    pub const fn is_past_due(self, os_now_millis: i64) -> bool {
        self.os_trigger_millis <= os_now_millis
    }
}

/// Converts caller wall-clock targets into host-clock triggers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockSkewTranslator;

impl ClockSkewTranslator {
    /// Translate `target_time` onto the host clock.
    ///
    /// `caller_now_millis` should be sampled as close as possible to
    /// `os_now_millis`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the result does not fit the i64
    /// epoch-millisecond range.
    pub fn translate(
        target_time: DateTime<Utc>,
        os_now_millis: i64,
        caller_now_millis: i64,
    ) -> Result<TranslatedTrigger> {
        let target_millis = target_time.timestamp_millis();
        target_millis
            .checked_sub(caller_now_millis)
            .and_then(|delay| os_now_millis.checked_add(delay))
            .map(|os_trigger_millis| TranslatedTrigger { os_trigger_millis })
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "target time {target_millis}ms is unrepresentable on the host clock \
                     (os_now={os_now_millis}, caller_now={caller_now_millis})"
                ))
            })
    }

    /// Offset of the host clock relative to the caller clock.
    #[must_use]
    pub const fn skew_millis(os_now_millis: i64, caller_now_millis: i64) -> i64 {
        os_now_millis.saturating_sub(caller_now_millis)
    }
}

/// Build a wall-clock instant from epoch milliseconds.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the instant is outside the supported
/// calendar range.
pub fn target_from_epoch_millis(epoch_millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(epoch_millis).ok_or_else(|| {
        Error::invalid_input(format!("epoch millis {epoch_millis} is not a representable instant"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(epoch_millis: i64) -> Result<DateTime<Utc>> {
        target_from_epoch_millis(epoch_millis)
    }

    #[test]
    fn test_translate_carries_delay_across_clocks() -> Result<()> {
        let trigger = ClockSkewTranslator::translate(at(4_000)?, 5_000, 1_000)?;
        assert_eq!(trigger.os_trigger_millis(), 8_000);
        assert_eq!(trigger.delay_from(5_000), 3_000);
        assert!(!trigger.is_past_due(5_000));
        Ok(())
    }

    #[test]
    fn test_translate_past_target_is_not_clamped() -> Result<()> {
        let trigger = ClockSkewTranslator::translate(at(500)?, 5_000, 1_000)?;
        assert_eq!(trigger.os_trigger_millis(), 4_500);
        assert!(trigger.is_past_due(5_000));
        Ok(())
    }

    #[test]
    fn test_translate_target_equal_to_now_fires_now() -> Result<()> {
        let trigger = ClockSkewTranslator::translate(at(1_000)?, 5_000, 1_000)?;
        assert_eq!(trigger.os_trigger_millis(), 5_000);
        assert!(trigger.is_past_due(5_000));
        Ok(())
    }

    #[test]
    fn test_translate_overflow_is_invalid_input() -> Result<()> {
        let result = ClockSkewTranslator::translate(at(1_000)?, i64::MAX, 0);
        assert!(result.is_err_and(|e| e.is_invalid_input()));

        let result = ClockSkewTranslator::translate(at(1_000)?, 0, i64::MIN);
        assert!(result.is_err_and(|e| e.is_invalid_input()));
        Ok(())
    }

    #[test]
    fn test_target_from_epoch_millis_rejects_out_of_range() {
        assert!(target_from_epoch_millis(i64::MAX).is_err_and(|e| e.is_invalid_input()));
        assert!(target_from_epoch_millis(0).is_ok());
    }

    #[test]
    fn test_skew_millis_saturates() {
        assert_eq!(ClockSkewTranslator::skew_millis(5_000, 1_000), 4_000);
        assert_eq!(ClockSkewTranslator::skew_millis(i64::MIN, 1), i64::MIN);
    }
}
