//! In-memory dispatch capability.
//!
//! Keeps the pending-alarm table in process and journals every call it
//! accepts. `fire_due` plays the role of the host timer: it consumes due
//! one-shot alarms and advances repeating ones.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use itertools::Itertools;
use reveille_core::{ActionRef, AlarmId, Error, Result};

use crate::dispatch::{AlarmDispatch, Exactness};

/// Key of the pending-alarm table.
type AlarmKey = (AlarmId, ActionRef);

/// How a pending alarm is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Fires once, then leaves the table.
    OneShot(Exactness),
    /// Fires every `interval_millis`.
    Repeating { interval_millis: i64 },
}

/// An alarm waiting in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAlarm {
    pub id: AlarmId,
    pub action: ActionRef,
    /// Next trigger on the host clock.
    pub os_trigger_millis: i64,
    pub delivery: Delivery,
}

/// A call accepted by the dispatch capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchCall {
    RegisterOneShot {
        id: AlarmId,
        os_trigger_millis: i64,
        exactness: Exactness,
        action: ActionRef,
    },
    RegisterRepeating {
        id: AlarmId,
        first_os_trigger_millis: i64,
        interval_millis: i64,
        action: ActionRef,
    },
    Cancel {
        id: AlarmId,
        action: ActionRef,
    },
}

impl DispatchCall {
    /// The alarm id the call targets.
    #[must_use]
    pub const fn id(&self) -> AlarmId {
        match self {
            Self::RegisterOneShot { id, .. }
            | Self::RegisterRepeating { id, .. }
            | Self::Cancel { id, .. } => *id,
        }
    }

    /// Check if the call is a registration.
    #[must_use]
    pub const fn is_register(&self) -> bool {
        !matches!(self, Self::Cancel { .. })
    }
}

/// An alarm delivered by [`InMemoryDispatch::fire_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredAlarm {
    pub id: AlarmId,
    pub action: ActionRef,
    /// Trigger the alarm was due at.
    pub os_trigger_millis: i64,
}

#[derive(Debug, Default)]
struct DispatchState {
    pending: HashMap<AlarmKey, PendingAlarm>,
    calls: Vec<DispatchCall>,
}

/// Dispatch capability backed by an in-process table.
#[derive(Debug)]
pub struct InMemoryDispatch {
    state: Mutex<DispatchState>,
    available: AtomicBool,
}

impl Default for InMemoryDispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDispatch {
    /// Create an empty, reachable dispatch table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DispatchState::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Mark the capability reachable or unreachable.
    ///
    /// While unreachable every call fails with
    /// [`Error::DispatchUnavailable`] and leaves the table untouched.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Every accepted call, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock is poisoned.
    pub fn calls(&self) -> Result<Vec<DispatchCall>> {
        Ok(self.lock()?.calls.clone())
    }

    /// Accepted calls targeting `id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock is poisoned.
    pub fn calls_for(&self, id: AlarmId) -> Result<Vec<DispatchCall>> {
        Ok(self
            .lock()?
            .calls
            .iter()
            .filter(|call| call.id() == id)
            .cloned()
            .collect_vec())
    }

    /// Pending alarms ordered by trigger, then id.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock is poisoned.
    pub fn pending(&self) -> Result<Vec<PendingAlarm>> {
        Ok(self
            .lock()?
            .pending
            .values()
            .cloned()
            .sorted_by_key(|alarm| (alarm.os_trigger_millis, alarm.id))
            .collect_vec())
    }

    /// Pending alarms registered under `id`, for any action.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock is poisoned.
    pub fn pending_for(&self, id: AlarmId) -> Result<Vec<PendingAlarm>> {
        Ok(self
            .pending()?
            .into_iter()
            .filter(|alarm| alarm.id == id)
            .collect_vec())
    }

    /// Number of pending alarms.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock is poisoned.
    pub fn pending_count(&self) -> Result<usize> {
        Ok(self.lock()?.pending.len())
    }

    /// Deliver every alarm due at `os_now_millis`.
    ///
    /// One-shot alarms leave the table. A repeating alarm fires once, even if
    /// several intervals elapsed, and moves to its first trigger after
    /// `os_now_millis`. Returns the fired alarms ordered by trigger, then id.
    ///
    /// # Errors
    ///
    /// Returns an error if the capability is unreachable.
    pub fn fire_due(&self, os_now_millis: i64) -> Result<Vec<FiredAlarm>> {
        self.ensure_available()?;
        let mut state = self.lock()?;

        let due_keys = state
            .pending
            .iter()
            .filter(|(_, alarm)| alarm.os_trigger_millis <= os_now_millis)
            .map(|(key, alarm)| (alarm.os_trigger_millis, key.clone()))
            .sorted()
            .map(|(_, key)| key)
            .collect_vec();

        let mut fired = Vec::with_capacity(due_keys.len());
        for key in due_keys {
            let Some(alarm) = state.pending.remove(&key) else {
                continue;
            };

            fired.push(FiredAlarm {
                id: alarm.id,
                action: alarm.action.clone(),
                os_trigger_millis: alarm.os_trigger_millis,
            });

            if let Delivery::Repeating { interval_millis } = alarm.delivery {
                match next_trigger(alarm.os_trigger_millis, interval_millis, os_now_millis) {
                    Some(os_trigger_millis) => {
                        state.pending.insert(
                            key,
                            PendingAlarm {
                                os_trigger_millis,
                                ..alarm
                            },
                        );
                    }
                    None => {
                        tracing::warn!(
                            alarm_id = %alarm.id,
                            action = %alarm.action,
                            "Repeating alarm has no representable next trigger; dropping"
                        );
                    }
                }
            }
        }

        Ok(fired)
    }

    /// Remove every pending alarm and forget the call journal.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock is poisoned.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.pending.clear();
        state.calls.clear();
        Ok(())
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::dispatch_unavailable("in-memory dispatch marked unavailable"))
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, DispatchState>> {
        self.state
            .lock()
            .map_err(|_| Error::dispatch_unavailable("pending alarm table lock poisoned"))
    }

    fn register(&self, alarm: PendingAlarm, call: DispatchCall) -> Result<()> {
        self.ensure_available()?;
        let mut state = self.lock()?;
        let key = (alarm.id, alarm.action.clone());
        if let Some(previous) = state.pending.insert(key, alarm) {
            tracing::trace!(
                alarm_id = %previous.id,
                action = %previous.action,
                "Replaced pending alarm"
            );
        }
        state.calls.push(call);
        Ok(())
    }
}

/// First trigger strictly after `os_now_millis` on the grid
/// `trigger + k * interval`.
fn next_trigger(trigger: i64, interval_millis: i64, os_now_millis: i64) -> Option<i64> {
    if interval_millis <= 0 {
        return None;
    }
    let elapsed_intervals = os_now_millis
        .checked_sub(trigger)?
        .checked_div(interval_millis)?
        .checked_add(1)?;
    interval_millis
        .checked_mul(elapsed_intervals)
        .and_then(|offset| trigger.checked_add(offset))
}

impl AlarmDispatch for InMemoryDispatch {
    fn register_one_shot(
        &self,
        id: AlarmId,
        os_trigger_millis: i64,
        exactness: Exactness,
        action: &ActionRef,
    ) -> Result<()> {
        self.register(
            PendingAlarm {
                id,
                action: action.clone(),
                os_trigger_millis,
                delivery: Delivery::OneShot(exactness),
            },
            DispatchCall::RegisterOneShot {
                id,
                os_trigger_millis,
                exactness,
                action: action.clone(),
            },
        )
    }

    fn register_repeating(
        &self,
        id: AlarmId,
        first_os_trigger_millis: i64,
        interval_millis: i64,
        action: &ActionRef,
    ) -> Result<()> {
        self.register(
            PendingAlarm {
                id,
                action: action.clone(),
                os_trigger_millis: first_os_trigger_millis,
                delivery: Delivery::Repeating { interval_millis },
            },
            DispatchCall::RegisterRepeating {
                id,
                first_os_trigger_millis,
                interval_millis,
                action: action.clone(),
            },
        )
    }

    fn cancel(&self, id: AlarmId, action: &ActionRef) -> Result<()> {
        self.ensure_available()?;
        let mut state = self.lock()?;
        if state.pending.remove(&(id, action.clone())).is_none() {
            tracing::trace!(alarm_id = %id, action = %action, "No pending alarm to cancel");
        }
        state.calls.push(DispatchCall::Cancel {
            id,
            action: action.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(name: &str) -> Result<ActionRef> {
        ActionRef::new(name)
    }

    #[test]
    fn test_register_replaces_same_key() -> Result<()> {
        let dispatch = InMemoryDispatch::new();
        let wake = action("wake")?;

        dispatch.register_one_shot(AlarmId::new(1), 100, Exactness::Exact, &wake)?;
        dispatch.register_one_shot(AlarmId::new(1), 200, Exactness::Inexact, &wake)?;

        let pending = dispatch.pending()?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.first().map(|a| a.os_trigger_millis), Some(200));
        assert_eq!(
            pending.first().map(|a| a.delivery),
            Some(Delivery::OneShot(Exactness::Inexact))
        );
        Ok(())
    }

    #[test]
    fn test_same_id_different_action_coexist() -> Result<()> {
        let dispatch = InMemoryDispatch::new();
        dispatch.register_one_shot(AlarmId::new(1), 100, Exactness::Exact, &action("a")?)?;
        dispatch.register_one_shot(AlarmId::new(1), 100, Exactness::Exact, &action("b")?)?;

        assert_eq!(dispatch.pending_for(AlarmId::new(1))?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_cancel_missing_is_noop() -> Result<()> {
        let dispatch = InMemoryDispatch::new();
        dispatch.cancel(AlarmId::new(9), &action("wake")?)?;
        dispatch.cancel(AlarmId::new(9), &action("wake")?)?;

        assert_eq!(dispatch.pending_count()?, 0);
        assert_eq!(dispatch.calls()?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_unavailable_rejects_without_effect() -> Result<()> {
        let dispatch = InMemoryDispatch::new();
        dispatch.set_available(false);

        let result = dispatch.register_one_shot(AlarmId::new(1), 100, Exactness::Exact, &action("a")?);
        assert!(result.is_err_and(|e| e.is_dispatch_unavailable()));
        assert!(dispatch.cancel(AlarmId::new(1), &action("a")?).is_err());
        assert!(dispatch.fire_due(1_000).is_err());

        assert_eq!(dispatch.pending_count()?, 0);
        assert!(dispatch.calls()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_fire_due_consumes_one_shots_in_order() -> Result<()> {
        let dispatch = InMemoryDispatch::new();
        dispatch.register_one_shot(AlarmId::new(2), 300, Exactness::Exact, &action("late")?)?;
        dispatch.register_one_shot(AlarmId::new(1), 100, Exactness::Inexact, &action("early")?)?;
        dispatch.register_one_shot(AlarmId::new(3), 900, Exactness::Exact, &action("future")?)?;

        let fired = dispatch.fire_due(500)?;
        let ids = fired.iter().map(|f| f.id.get()).collect_vec();
        assert_eq!(ids, vec![1, 2]);

        let pending = dispatch.pending()?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.first().map(|a| a.id), Some(AlarmId::new(3)));
        Ok(())
    }

    #[test]
    fn test_fire_due_advances_repeating() -> Result<()> {
        let dispatch = InMemoryDispatch::new();
        dispatch.register_repeating(AlarmId::new(3), 8_000, 60_000, &action("tick")?)?;

        assert!(dispatch.fire_due(7_999)?.is_empty());

        let fired = dispatch.fire_due(8_000)?;
        assert_eq!(fired.len(), 1);
        assert_eq!(
            dispatch.pending()?.first().map(|a| a.os_trigger_millis),
            Some(68_000)
        );

        // Missed several intervals: one delivery, next trigger after now.
        let fired = dispatch.fire_due(200_000)?;
        assert_eq!(fired.len(), 1);
        assert_eq!(
            dispatch.pending()?.first().map(|a| a.os_trigger_millis),
            Some(248_000)
        );
        Ok(())
    }

    #[test]
    fn test_next_trigger_overflow() {
        assert_eq!(next_trigger(i64::MAX - 10, 100, i64::MAX - 10), None);
        assert_eq!(next_trigger(0, 0, 10), None);
        assert_eq!(next_trigger(0, 10, 25), Some(30));
    }

    #[test]
    fn test_clear() -> Result<()> {
        let dispatch = InMemoryDispatch::new();
        dispatch.register_repeating(AlarmId::new(1), 10, 10, &action("a")?)?;
        dispatch.clear()?;

        assert_eq!(dispatch.pending_count()?, 0);
        assert!(dispatch.calls()?.is_empty());
        Ok(())
    }
}
