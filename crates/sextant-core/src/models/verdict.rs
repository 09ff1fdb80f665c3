use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome classification of matching one fact against the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    ExactMatch,
    HighMatch,
    PartialMatch,
    LowMatch,
    NoMatch,
    NewPattern,
}

impl Verdict {
    pub const ALL: [Verdict; 6] = [
        Self::ExactMatch,
        Self::HighMatch,
        Self::PartialMatch,
        Self::LowMatch,
        Self::NoMatch,
        Self::NewPattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactMatch => "EXACT_MATCH",
            Self::HighMatch => "HIGH_MATCH",
            Self::PartialMatch => "PARTIAL_MATCH",
            Self::LowMatch => "LOW_MATCH",
            Self::NoMatch => "NO_MATCH",
            Self::NewPattern => "NEW_PATTERN",
        }
    }

    /// Verdicts that carry a pattern id.
    pub fn is_match(&self) -> bool {
        matches!(
            self,
            Self::ExactMatch | Self::HighMatch | Self::PartialMatch | Self::LowMatch
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown verdict: {s}"))
    }
}
