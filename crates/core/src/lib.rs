//! Core types, errors, and result helpers for Reveille.
//!
//! All errors are explicit and typed; nothing in this workspace panics on a
//! bad request or an unreachable host capability.

pub mod error;
pub mod result;
pub mod types;

pub use error::{Capability, Error};
pub use result::{Result, ResultExt};
pub use types::{ActionRef, AlarmId};
