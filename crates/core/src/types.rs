//! Identifier types shared by the scheduler and its capabilities.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::result::Result;

/// Caller-chosen alarm identifier.
///
/// Used as the dedup and cancellation key: registering under an id that
/// already has a pending alarm replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(i32);

impl AlarmId {
    /// Create an alarm ID from a raw integer.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the raw integer.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for AlarmId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AlarmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle naming the action the host invokes when an alarm fires.
///
/// Deserialization goes through [`ActionRef::new`], so a blank name is
/// rejected there too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionRef(String);

impl ActionRef {
    /// Create an action reference from its name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the name is empty or only whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_input("action name must not be empty"));
        }
        Ok(Self(name))
    }

    /// Get the action name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ActionRef {
    type Error = Error;

    fn try_from(name: String) -> Result<Self> {
        Self::new(name)
    }
}

impl From<ActionRef> for String {
    fn from(action: ActionRef) -> Self {
        action.0
    }
}

impl std::fmt::Display for ActionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
