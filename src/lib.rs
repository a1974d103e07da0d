#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # Reveille
//!
//! Wall-clock alarm scheduling over host dispatch and clock capabilities.
//!
//! This library re-exports the workspace crates for convenience.

pub use reveille_alarms;
pub use reveille_core;

pub mod prelude;
