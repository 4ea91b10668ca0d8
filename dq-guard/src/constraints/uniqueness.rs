//! Uniqueness constraint: every row carries a distinct value.

use crate::analyzers::{Analyzer, MetricScope};
use crate::core::{Constraint, ConstraintResult, EvaluationContext};
use crate::prelude::*;
use async_trait::async_trait;
use tracing::instrument;

/// Checks that a column's distinct value count equals the row count.
///
/// Nulls are not values, so a column with a null is never unique. When the
/// `count_distinct` metric is unavailable the `distinctness` ratio is used instead.
#[derive(Debug, Clone)]
pub struct UniquenessConstraint {
    column: String,
}

impl UniquenessConstraint {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

#[async_trait]
impl Constraint for UniquenessConstraint {
    #[instrument(skip(self, ctx), fields(constraint.column = %self.column))]
    async fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<ConstraintResult> {
        let size = ctx.metric(Analyzer::Size, &MetricScope::Table)?;
        match ctx.column_metric(Analyzer::CountDistinct, &self.column) {
            Ok(distinct) => Ok(ConstraintResult::from_check(
                distinct == size,
                distinct,
                format!(
                    "observed {distinct} distinct values of '{}' in {size} rows, expected {size}",
                    self.column
                ),
            )),
            Err(GuardError::MissingMetric { .. }) => {
                let distinctness = ctx.column_metric(Analyzer::Distinctness, &self.column)?;
                Ok(ConstraintResult::from_check(
                    distinctness == 1.0,
                    distinctness,
                    format!(
                        "observed distinctness {distinctness:.4} for '{}', expected 1",
                        self.column
                    ),
                ))
            }
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> &str {
        "is_unique"
    }

    fn column(&self) -> Option<&str> {
        Some(&self.column)
    }

    fn description(&self) -> String {
        format!("is_unique({})", self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{MetricSnapshot, MetricValue};
    use crate::test_fixtures::{departments, employees_sample};

    #[tokio::test]
    async fn test_duplicate_key_fails() {
        let table = employees_sample();
        let snapshot = crate::analyzers::analyze(&table);
        let ctx = EvaluationContext::new(&table, &snapshot);

        let result = UniquenessConstraint::new("emp_no").evaluate(&ctx).await.unwrap();
        assert!(result.status.is_failure());
        assert_eq!(result.metric, Some(2.0));
        assert_eq!(
            result.message,
            "observed 2 distinct values of 'emp_no' in 3 rows, expected 3"
        );

        let result = UniquenessConstraint::new("first_name").evaluate(&ctx).await.unwrap();
        assert!(result.status.is_success());
    }

    #[tokio::test]
    async fn test_falls_back_to_distinctness() {
        let table = departments();
        let snapshot = MetricSnapshot::builder("departments")
            .metric(Analyzer::Size, MetricScope::Table, MetricValue::Count(3))
            .metric(
                Analyzer::Distinctness,
                MetricScope::column("dept_no"),
                MetricValue::Ratio(1.0),
            )
            .build();
        let ctx = EvaluationContext::new(&table, &snapshot);

        let result = UniquenessConstraint::new("dept_no").evaluate(&ctx).await.unwrap();
        assert!(result.status.is_success());
        assert_eq!(result.metric, Some(1.0));
    }
}
