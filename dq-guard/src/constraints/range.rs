//! Numeric range constraint.

use crate::analyzers::Analyzer;
use crate::core::{Constraint, ConstraintResult, EvaluationContext, EvaluationMode};
use crate::prelude::*;
use crate::table::ColumnType;
use arrow::array::AsArray;
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use async_trait::async_trait;
use tracing::instrument;

/// Checks that a numeric column stays within `[min, max]`.
///
/// By default the check reads the column's `minimum` and `maximum` metrics. In
/// per-row mode every non-null value is compared instead, which reports how many
/// rows are out of range. Both modes accept and reject the same tables, except that
/// per-row mode treats NaN and infinite values as out of range. Neither mode
/// coerces a non-numeric column: text holding numbers is rejected, not parsed.
///
/// # Examples
///
/// ```rust
/// use dq_guard::constraints::NumericRangeConstraint;
/// use dq_guard::core::{Constraint, EvaluationMode};
///
/// let aggregate = NumericRangeConstraint::new("salary", 30000.0, 200000.0);
/// assert_eq!(aggregate.mode(), EvaluationMode::Aggregate);
///
/// let per_row = aggregate.per_row();
/// assert_eq!(per_row.description(), "numeric_range(salary, 30000, 200000, per_row)");
/// ```
#[derive(Debug, Clone)]
pub struct NumericRangeConstraint {
    column: String,
    min: f64,
    max: f64,
    per_row: bool,
}

impl NumericRangeConstraint {
    pub fn new(column: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            column: column.into(),
            min,
            max,
            per_row: false,
        }
    }

    /// Switches to comparing every row instead of the aggregate extrema.
    pub fn per_row(mut self) -> Self {
        self.per_row = true;
        self
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn evaluate_aggregate(&self, ctx: &EvaluationContext<'_>) -> Result<ConstraintResult> {
        let observed_min = ctx.column_metric(Analyzer::Minimum, &self.column)?;
        let observed_max = ctx.column_metric(Analyzer::Maximum, &self.column)?;
        let passed = self.contains(observed_min) && self.contains(observed_max);
        let message = format!(
            "observed range [{observed_min}, {observed_max}] for '{}', expected within [{}, {}]",
            self.column, self.min, self.max
        );
        Ok(if passed {
            ConstraintResult::success(message)
        } else {
            ConstraintResult::failure(message)
        })
    }

    fn evaluate_rows(&self, ctx: &EvaluationContext<'_>) -> Result<ConstraintResult> {
        if let Some((_, column)) = ctx.table().column(&self.column) {
            if column.column_type != ColumnType::Numeric {
                return Err(GuardError::constraint_evaluation(
                    self.description(),
                    format!(
                        "column '{}' is {}, expected numeric",
                        self.column,
                        column.column_type.as_str()
                    ),
                ));
            }
        }

        let mut checked = 0u64;
        let mut outside = 0u64;
        for array in ctx.table().column_arrays(&self.column)? {
            let values = cast(array, &DataType::Float64)?;
            for value in values.as_primitive::<Float64Type>().iter().flatten() {
                checked += 1;
                if !self.contains(value) {
                    outside += 1;
                }
            }
        }

        let ratio = if checked == 0 {
            1.0
        } else {
            (checked - outside) as f64 / checked as f64
        };
        Ok(ConstraintResult::from_check(
            outside == 0,
            ratio,
            format!(
                "observed {outside} of {checked} values of '{}' outside [{}, {}], expected none",
                self.column, self.min, self.max
            ),
        ))
    }
}

#[async_trait]
impl Constraint for NumericRangeConstraint {
    #[instrument(skip(self, ctx), fields(constraint.column = %self.column, min = self.min, max = self.max, per_row = self.per_row))]
    async fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<ConstraintResult> {
        if self.per_row {
            self.evaluate_rows(ctx)
        } else {
            self.evaluate_aggregate(ctx)
        }
    }

    fn name(&self) -> &str {
        "numeric_range"
    }

    fn column(&self) -> Option<&str> {
        Some(&self.column)
    }

    fn description(&self) -> String {
        let suffix = if self.per_row { ", per_row" } else { "" };
        format!(
            "numeric_range({}, {}, {}{suffix})",
            self.column, self.min, self.max
        )
    }

    fn mode(&self) -> EvaluationMode {
        if self.per_row {
            EvaluationMode::Scan
        } else {
            EvaluationMode::Aggregate
        }
    }
}
