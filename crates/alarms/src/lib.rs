//! Wall-clock alarm scheduling over host capabilities.
//!
//! Callers ask for an action to fire at a wall-clock instant, once or
//! repeatedly, and may later cancel it. The host that actually fires alarms
//! may keep a different clock than the caller, so every target is translated
//! onto the host clock before registration.
//!
//! - [`ClockSkewTranslator`]: carries the delay-from-now across clocks.
//! - [`AlarmScheduler`]: validates requests and makes exactly one
//!   registration or cancellation call per operation.
//! - [`Clock`] and [`AlarmDispatch`]: the capabilities the scheduler consumes.
//! - [`InMemoryDispatch`], [`ManualClock`], [`SystemClock`]: in-process
//!   implementations of those capabilities.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use reveille_alarms::{AlarmRequest, AlarmScheduler, InMemoryDispatch, ManualClock};
//!
//! let dispatch = Arc::new(InMemoryDispatch::new());
//! let scheduler = AlarmScheduler::new(dispatch.clone(), Arc::new(ManualClock::new(5_000)));
//!
//! let request = AlarmRequest::exact(AlarmId::new(7), target, ActionRef::new("wake")?);
//! scheduler.schedule_exact(&request)?;
//! scheduler.cancel(AlarmId::new(7), &request.action)?;
//! ```

mod clock;
mod config;
mod dispatch;
mod memory;
mod request;
mod scheduler;
mod translator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ENV_MIN_REPEAT_INTERVAL_MS, ENV_SKEW_WARN_THRESHOLD_MS, SchedulerConfig};
pub use dispatch::{AlarmDispatch, Exactness};
pub use memory::{Delivery, DispatchCall, FiredAlarm, InMemoryDispatch, PendingAlarm};
pub use request::{AlarmMode, AlarmRequest};
pub use scheduler::AlarmScheduler;
pub use translator::{ClockSkewTranslator, TranslatedTrigger, target_from_epoch_millis};

pub use reveille_core::{ActionRef, AlarmId, Capability, Error, Result, ResultExt};
