//! Completeness constraint: the share of non-null values in a column.

use crate::analyzers::Analyzer;
use crate::core::{Constraint, ConstraintResult, EvaluationContext};
use crate::prelude::*;
use async_trait::async_trait;
use tracing::instrument;

/// Checks that a column's completeness reaches a threshold.
///
/// With the default threshold of 1.0 this is `isComplete`: no nulls at all. A lower
/// threshold expresses "mostly complete".
///
/// # Examples
///
/// ```rust
/// use dq_guard::constraints::CompletenessConstraint;
/// use dq_guard::core::Constraint;
///
/// let strict = CompletenessConstraint::complete("emp_no");
/// assert_eq!(strict.description(), "is_complete(emp_no)");
///
/// let mostly = CompletenessConstraint::with_threshold("gender", 0.9);
/// assert_eq!(mostly.description(), "is_complete(gender, threshold=0.9)");
/// ```
#[derive(Debug, Clone)]
pub struct CompletenessConstraint {
    column: String,
    threshold: f64,
}

impl CompletenessConstraint {
    /// Requires a column without nulls.
    pub fn complete(column: impl Into<String>) -> Self {
        Self::with_threshold(column, 1.0)
    }

    /// Requires at least `threshold` of the rows to be non-null.
    ///
    /// The threshold is clamped to `[0, 1]`.
    pub fn with_threshold(column: impl Into<String>, threshold: f64) -> Self {
        Self {
            column: column.into(),
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[async_trait]
impl Constraint for CompletenessConstraint {
    #[instrument(skip(self, ctx), fields(constraint.column = %self.column, constraint.threshold = self.threshold))]
    async fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<ConstraintResult> {
        let completeness = ctx.column_metric(Analyzer::Completeness, &self.column)?;
        let passed = completeness >= self.threshold;

        Ok(ConstraintResult::from_check(
            passed,
            completeness,
            format!(
                "observed completeness {completeness:.4} for '{}', expected at least {}",
                self.column, self.threshold
            ),
        ))
    }

    fn name(&self) -> &str {
        "is_complete"
    }

    fn column(&self) -> Option<&str> {
        Some(&self.column)
    }

    fn description(&self) -> String {
        if self.threshold >= 1.0 {
            format!("is_complete({})", self.column)
        } else {
            format!("is_complete({}, threshold={})", self.column, self.threshold)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyze;
    use crate::test_fixtures::{empty_employees, employees};

    async fn evaluate(
        table: &Table,
        constraint: CompletenessConstraint,
    ) -> Result<ConstraintResult> {
        let snapshot = analyze(table);
        let ctx = EvaluationContext::new(table, &snapshot);
        constraint.evaluate(&ctx).await
    }

    #[tokio::test]
    async fn test_complete_column() {
        let result = evaluate(&employees(), CompletenessConstraint::complete("first_name"))
            .await
            .unwrap();
        assert!(result.status.is_success());
        assert_eq!(result.metric, Some(1.0));
    }

    #[tokio::test]
    async fn test_mostly_complete_column() {
        // one of five genders is null
        let table = employees();
        let strict = evaluate(&table, CompletenessConstraint::complete("gender"))
            .await
            .unwrap();
        assert!(strict.status.is_failure());
        assert_eq!(strict.metric, Some(0.8));

        let mostly = evaluate(&table, CompletenessConstraint::with_threshold("gender", 0.75))
            .await
            .unwrap();
        assert!(mostly.status.is_success());
    }

    #[tokio::test]
    async fn test_empty_table_is_not_complete() {
        let result = evaluate(&empty_employees(), CompletenessConstraint::complete("emp_no"))
            .await
            .unwrap();
        assert!(result.status.is_failure());
        assert_eq!(result.metric, Some(0.0));
    }

    #[tokio::test]
    async fn test_unknown_column_is_an_error() {
        let err = evaluate(&employees(), CompletenessConstraint::complete("salary"))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::ColumnNotFound { .. }));
    }
}
