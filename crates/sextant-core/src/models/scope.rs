//! Scope: the partition key of the pattern library.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The (spec version, message root, airline code) tuple that partitions the
/// pattern library. `airline_code = None` is the generic, airline-agnostic scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope {
    pub spec_version: String,
    pub message_root: String,
    pub airline_code: Option<String>,
}

impl Scope {
    /// Generic scope (no airline).
    pub fn new(spec_version: impl Into<String>, message_root: impl Into<String>) -> Self {
        Self {
            spec_version: spec_version.into(),
            message_root: message_root.into(),
            airline_code: None,
        }
    }

    /// Same scope narrowed to one airline.
    pub fn with_airline(mut self, airline_code: impl Into<String>) -> Self {
        self.airline_code = Some(airline_code.into());
        self
    }

    pub fn is_generic(&self) -> bool {
        self.airline_code.is_none()
    }

    /// The generic scope sharing this scope's spec version and message root.
    pub fn generic(&self) -> Self {
        Self {
            spec_version: self.spec_version.clone(),
            message_root: self.message_root.clone(),
            airline_code: None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.spec_version,
            self.message_root,
            self.airline_code.as_deref().unwrap_or("*")
        )
    }
}
