//! Outcomes of evaluating checks against a table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{ConstraintResult, Level};

/// Status of a check or of a whole validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Success,
    Warning,
    Error,
}

impl CheckStatus {
    /// Status of a check at `level` given whether any of its constraints failed.
    pub fn for_level(level: Level, any_failed: bool) -> Self {
        match (any_failed, level) {
            (false, _) => CheckStatus::Success,
            (true, Level::Warning) => CheckStatus::Warning,
            (true, Level::Error) => CheckStatus::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Success => "success",
            CheckStatus::Warning => "warning",
            CheckStatus::Error => "error",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_name: String,
    pub level: Level,
    pub status: CheckStatus,
    /// One result per constraint, in constraint order
    pub constraint_results: Vec<ConstraintResult>,
}

impl CheckResult {
    /// Builds a check result, deriving the status from the constraint results.
    pub fn new(
        check_name: impl Into<String>,
        level: Level,
        constraint_results: Vec<ConstraintResult>,
    ) -> Self {
        let any_failed = constraint_results.iter().any(|r| r.status.is_failure());
        Self {
            check_name: check_name.into(),
            level,
            status: CheckStatus::for_level(level, any_failed),
            constraint_results,
        }
    }

    pub fn passed_count(&self) -> usize {
        self.constraint_results
            .iter()
            .filter(|r| r.status.is_success())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.constraint_results.len() - self.passed_count()
    }
}

/// Result of validating one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub table_name: String,
    pub timestamp: DateTime<Utc>,
    /// The most severe check status
    pub status: CheckStatus,
    pub check_results: Vec<CheckResult>,
}

impl ValidationResult {
    /// Builds a validation result stamped with the current time.
    pub fn new(table_name: impl Into<String>, check_results: Vec<CheckResult>) -> Self {
        let status = check_results
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(CheckStatus::Success);
        Self {
            table_name: table_name.into(),
            timestamp: Utc::now(),
            status,
            check_results,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CheckStatus::Success
    }

    /// Total number of evaluated constraints.
    pub fn total_constraints(&self) -> usize {
        self.check_results
            .iter()
            .map(|c| c.constraint_results.len())
            .sum()
    }

    pub fn passed_constraints(&self) -> usize {
        self.check_results.iter().map(CheckResult::passed_count).sum()
    }

    pub fn failed_constraints(&self) -> usize {
        self.check_results.iter().map(CheckResult::failed_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed() -> ConstraintResult {
        ConstraintResult::failure("bad")
    }

    fn passed() -> ConstraintResult {
        ConstraintResult::success_with_metric(1.0, "good")
    }

    #[test]
    fn test_check_status_by_level() {
        assert_eq!(
            CheckResult::new("c", Level::Error, vec![passed(), failed()]).status,
            CheckStatus::Error
        );
        assert_eq!(
            CheckResult::new("c", Level::Warning, vec![failed()]).status,
            CheckStatus::Warning
        );
        assert_eq!(
            CheckResult::new("c", Level::Error, vec![passed()]).status,
            CheckStatus::Success
        );
    }

    #[test]
    fn test_overall_status_is_most_severe() {
        let warning = CheckResult::new("w", Level::Warning, vec![failed()]);
        let ok = CheckResult::new("ok", Level::Error, vec![passed()]);
        let result = ValidationResult::new("t", vec![ok.clone(), warning.clone()]);
        assert_eq!(result.status, CheckStatus::Warning);
        assert_eq!(result.total_constraints(), 2);
        assert_eq!(result.failed_constraints(), 1);

        let error = CheckResult::new("e", Level::Error, vec![failed()]);
        let result = ValidationResult::new("t", vec![warning, error, ok]);
        assert_eq!(result.status, CheckStatus::Error);

        assert!(ValidationResult::new("t", Vec::new()).is_success());
    }
}
