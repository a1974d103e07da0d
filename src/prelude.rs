//! Prelude module - common imports for Reveille
//!
//! ```rust
//! use reveille::prelude::*;
//! ```

// Re-export error types
pub use reveille_core::{ActionRef, AlarmId, Error, Result, ResultExt};

// Re-export scheduler and capabilities
pub use reveille_alarms::{
    AlarmDispatch, AlarmMode, AlarmRequest, AlarmScheduler, Clock, ClockSkewTranslator,
    Exactness, InMemoryDispatch, ManualClock, SchedulerConfig, SystemClock, TranslatedTrigger,
};
