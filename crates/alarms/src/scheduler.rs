//! Alarm scheduling and cancellation.
//!
//! The scheduler is a stateless service over two capabilities. Each operation
//! validates its request, samples the caller clock and the host clock
//! back-to-back, translates the target, and makes exactly one dispatch call.
//! Replacement of an existing alarm with the same key is the host's job.

use std::sync::Arc;

use reveille_core::{ActionRef, AlarmId, Error, Result, ResultExt};

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::dispatch::{AlarmDispatch, Exactness};
use crate::request::AlarmRequest;
use crate::translator::{ClockSkewTranslator, TranslatedTrigger};

/// Schedules and cancels alarms through a dispatch capability.
#[derive(Clone)]
pub struct AlarmScheduler {
    dispatch: Arc<dyn AlarmDispatch>,
    os_clock: Arc<dyn Clock>,
    caller_clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl std::fmt::Debug for AlarmScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlarmScheduler")
            .field("os_clock", &self.os_clock.name())
            .field("caller_clock", &self.caller_clock.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AlarmScheduler {
    /// Create a scheduler whose caller clock is the process wall clock.
    #[must_use]
    pub fn new(dispatch: Arc<dyn AlarmDispatch>, os_clock: Arc<dyn Clock>) -> Self {
        Self {
            dispatch,
            os_clock,
            caller_clock: Arc::new(SystemClock::new()),
            config: SchedulerConfig::default(),
        }
    }

    /// Use `clock` as the caller's notion of "now".
    #[must_use]
    pub fn with_caller_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.caller_clock = clock;
        self
    }

    /// Use `config` instead of the defaults.
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Register a one-shot alarm the host must not batch or delay.
    ///
    /// Replaces any pending alarm with the same id and action.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed or repeating request,
    /// or [`Error::DispatchUnavailable`] if a capability is unreachable.
    pub fn schedule_exact(&self, request: &AlarmRequest) -> Result<TranslatedTrigger> {
        self.schedule_one_shot(request, Exactness::Exact)
    }

    /// Register a one-shot alarm the host may coalesce or delay.
    ///
    /// Replaces any pending alarm with the same id and action.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed or repeating request,
    /// or [`Error::DispatchUnavailable`] if a capability is unreachable.
    pub fn schedule(&self, request: &AlarmRequest) -> Result<TranslatedTrigger> {
        self.schedule_one_shot(request, Exactness::Inexact)
    }

    /// Register an alarm that fires at the target and then every
    /// `request.interval_millis`.
    ///
    /// Interval accuracy is up to the host. A later registration or cancel
    /// with the same id and action supersedes all future firings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the request is not repeating or its
    /// interval is missing, not positive, or below the configured minimum;
    /// [`Error::DispatchUnavailable`] if a capability is unreachable.
    pub fn schedule_repeating(&self, request: &AlarmRequest) -> Result<TranslatedTrigger> {
        let interval_millis = self.repeat_interval(request).inspect_error(|e| {
            tracing::warn!(alarm_id = %request.id, error = %e, "Rejected repeating alarm");
        })?;
        let trigger = self.translate(request)?;

        self.dispatch
            .register_repeating(
                request.id,
                trigger.os_trigger_millis(),
                interval_millis,
                &request.action,
            )
            .inspect_error(|e| {
                tracing::warn!(alarm_id = %request.id, error = %e, "Failed to register repeating alarm");
            })?;

        tracing::debug!(
            alarm_id = %request.id,
            action = %request.action,
            os_trigger_millis = trigger.os_trigger_millis(),
            interval_millis,
            "Registered repeating alarm"
        );
        Ok(trigger)
    }

    /// Route `request` by its mode to [`schedule_exact`](Self::schedule_exact),
    /// [`schedule`](Self::schedule), or
    /// [`schedule_repeating`](Self::schedule_repeating).
    ///
    /// # Errors
    ///
    /// Returns whatever the selected operation returns.
    pub fn submit(&self, request: &AlarmRequest) -> Result<TranslatedTrigger> {
        match request.mode.exactness() {
            Some(exactness) => self.schedule_one_shot(request, exactness),
            None => self.schedule_repeating(request),
        }
    }

    /// Cancel the pending alarm for `(id, action)`.
    ///
    /// Cancelling a key with nothing pending succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DispatchUnavailable`] if the dispatch capability is
    /// unreachable.
    pub fn cancel(&self, id: AlarmId, action: &ActionRef) -> Result<()> {
        self.dispatch.cancel(id, action).inspect_error(|e| {
            tracing::warn!(alarm_id = %id, error = %e, "Failed to cancel alarm");
        })?;

        tracing::debug!(alarm_id = %id, action = %action, "Cancelled alarm");
        Ok(())
    }

    fn schedule_one_shot(
        &self,
        request: &AlarmRequest,
        exactness: Exactness,
    ) -> Result<TranslatedTrigger> {
        ensure_one_shot(request).inspect_error(|e| {
            tracing::warn!(alarm_id = %request.id, error = %e, "Rejected one-shot alarm");
        })?;
        let trigger = self.translate(request)?;

        self.dispatch
            .register_one_shot(
                request.id,
                trigger.os_trigger_millis(),
                exactness,
                &request.action,
            )
            .inspect_error(|e| {
                tracing::warn!(alarm_id = %request.id, error = %e, "Failed to register alarm");
            })?;

        tracing::debug!(
            alarm_id = %request.id,
            action = %request.action,
            os_trigger_millis = trigger.os_trigger_millis(),
            %exactness,
            "Registered one-shot alarm"
        );
        Ok(trigger)
    }

    fn repeat_interval(&self, request: &AlarmRequest) -> Result<i64> {
        if !request.mode.is_repeating() {
            return Err(Error::invalid_input(format!(
                "alarm {}: {} request passed to repeating schedule",
                request.id, request.mode
            )));
        }
        request.validate()?;

        let interval_millis = request
            .interval_millis
            .ok_or_else(|| Error::invalid_input("repeating mode requires an interval"))?;
        let minimum = self.config.min_repeat_interval_ms.max(1);
        if interval_millis < minimum {
            return Err(Error::invalid_input(format!(
                "alarm {}: repeat interval {interval_millis}ms is below the minimum {minimum}ms",
                request.id
            )));
        }
        Ok(interval_millis)
    }

    fn translate(&self, request: &AlarmRequest) -> Result<TranslatedTrigger> {
        let caller_now_millis = self.caller_clock.now_millis()?;
        let os_now_millis = self.os_clock.now_millis()?;
        self.check_skew(os_now_millis, caller_now_millis);

        let trigger =
            ClockSkewTranslator::translate(request.target_time, os_now_millis, caller_now_millis)?;
        if trigger.is_past_due(os_now_millis) {
            tracing::debug!(
                alarm_id = %request.id,
                os_trigger_millis = trigger.os_trigger_millis(),
                os_now_millis,
                "Target is past due; host fires immediately"
            );
        }
        Ok(trigger)
    }

    fn check_skew(&self, os_now_millis: i64, caller_now_millis: i64) {
        let Some(threshold) = self.config.skew_warn_threshold_ms else {
            return;
        };
        let skew = ClockSkewTranslator::skew_millis(os_now_millis, caller_now_millis);
        if skew.unsigned_abs() > threshold {
            tracing::warn!(
                skew_millis = skew,
                threshold_ms = threshold,
                os_clock = self.os_clock.name(),
                caller_clock = self.caller_clock.name(),
                "Caller and host clocks disagree beyond threshold"
            );
        }
    }
}

fn ensure_one_shot(request: &AlarmRequest) -> Result<()> {
    if request.mode.is_repeating() {
        return Err(Error::invalid_input(format!(
            "alarm {}: repeating request passed to one-shot schedule",
            request.id
        )));
    }
    request.validate()
}
