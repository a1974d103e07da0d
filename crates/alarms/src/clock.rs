//! Clock capability and the clocks shipped with the scheduler.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use chrono::Utc;
use reveille_core::{Error, Result};

/// Source of the current time in epoch milliseconds.
///
/// Readings must be consistent across calls within one process run. A clock
/// that cannot be read reports [`Error::DispatchUnavailable`].
pub trait Clock: Send + Sync {
    /// Read the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying time source is unreachable.
    fn now_millis(&self) -> Result<i64>;

    /// Name used in log output.
    fn name(&self) -> &str {
        "clock"
    }
}

/// Wall clock of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> Result<i64> {
        Ok(Utc::now().timestamp_millis())
    }

    fn name(&self) -> &str {
        "system"
    }
}

/// Clock whose reading only changes when told to.
///
/// Used to model a host OS clock in tests and simulations. It can be marked
/// unavailable to stand in for an uninitialised host time source.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
    available: AtomicBool,
}

impl ManualClock {
    /// Create a clock reading `now_millis`.
    #[must_use]
    pub const fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
            available: AtomicBool::new(true),
        }
    }

    /// Set the current reading.
    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    /// Move the clock by `delta_millis` and return the new reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the move leaves the i64 range; the
    /// reading is unchanged in that case.
    pub fn advance(&self, delta_millis: i64) -> Result<i64> {
        self.now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                now.checked_add(delta_millis)
            })
            .map_err(|now| {
                Error::invalid_input(format!("advancing clock at {now} by {delta_millis}ms overflows"))
            })
            .and_then(|previous| {
                previous
                    .checked_add(delta_millis)
                    .ok_or_else(|| Error::invalid_input("clock overflow"))
            })
    }

    /// Mark the clock reachable or unreachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Result<i64> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(Error::clock_unavailable("manual clock marked unavailable"));
        }
        Ok(self.now.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "manual"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_tracks_chrono() {
        let before = Utc::now().timestamp_millis();
        let reading = SystemClock::new().now_millis().ok();
        let after = Utc::now().timestamp_millis();

        assert!(reading.is_some_and(|now| now >= before && now <= after));
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_millis().ok(), Some(1_000));

        assert_eq!(clock.advance(500).ok(), Some(1_500));
        clock.set(42);
        assert_eq!(clock.now_millis().ok(), Some(42));
    }

    #[test]
    fn test_manual_clock_advance_overflow_leaves_reading() {
        let clock = ManualClock::new(i64::MAX);
        let result = clock.advance(1);

        assert!(result.is_err_and(|e| e.is_invalid_input()));
        assert_eq!(clock.now_millis().ok(), Some(i64::MAX));
    }

    #[test]
    fn test_manual_clock_unavailable() {
        let clock = ManualClock::new(0);
        clock.set_available(false);
        assert!(clock.now_millis().is_err_and(|e| e.is_dispatch_unavailable()));

        clock.set_available(true);
        assert!(clock.now_millis().is_ok());
    }
}
