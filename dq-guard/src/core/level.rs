//! Severity levels for checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How seriously a failing check is taken.
///
/// A failing `Error` check makes the whole validation result `Error`; a failing
/// `Warning` check only downgrades it to `Warning`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Warning,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering_and_serde() {
        assert!(Level::Error > Level::Warning);
        assert_eq!(Level::default(), Level::Warning);
        assert_eq!(serde_json::to_string(&Level::Error).unwrap(), "\"error\"");
        let parsed: Level = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(parsed, Level::Warning);
    }
}
