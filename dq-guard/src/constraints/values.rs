//! Allowed-value constraint.

use crate::core::{Constraint, ConstraintResult, EvaluationContext, EvaluationMode};
use crate::logging::truncate_field;
use crate::prelude::*;
use arrow::array::Array;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Number of distinct offending values quoted in a failure message.
const MAX_SAMPLES: usize = 5;
const MAX_SAMPLE_LENGTH: usize = 64;

/// Checks that every non-null value of a column is in an allowed set.
///
/// Values are compared by their display form, so `{"1", "2"}` matches an integer
/// column holding 1 and 2. Nulls are ignored. This constraint scans the rows.
///
/// # Examples
///
/// ```rust
/// use dq_guard::constraints::ContainedInConstraint;
/// use dq_guard::core::{Constraint, EvaluationMode};
///
/// let constraint = ContainedInConstraint::new("gender", ["M", "F"]);
/// assert_eq!(constraint.description(), "is_contained_in(gender, {F, M})");
/// assert_eq!(constraint.mode(), EvaluationMode::Scan);
/// ```
#[derive(Debug, Clone)]
pub struct ContainedInConstraint {
    column: String,
    allowed: BTreeSet<String>,
}

impl ContainedInConstraint {
    pub fn new<I, S>(column: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    fn allowed_display(&self) -> String {
        let values: Vec<&str> = self.allowed.iter().map(String::as_str).collect();
        format!("{{{}}}", values.join(", "))
    }
}

#[async_trait]
impl Constraint for ContainedInConstraint {
    #[instrument(skip(self, ctx), fields(constraint.column = %self.column, allowed = self.allowed.len()))]
    async fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<ConstraintResult> {
        let options = FormatOptions::default();
        let mut checked = 0u64;
        let mut violations = 0u64;
        let mut samples = BTreeSet::new();

        for array in ctx.table().column_arrays(&self.column)? {
            let formatter = ArrayFormatter::try_new(array.as_ref(), &options)?;
            let nulls = array.logical_nulls();
            for idx in 0..array.len() {
                if nulls.as_ref().is_some_and(|n| n.is_null(idx)) {
                    continue;
                }
                checked += 1;
                let value = formatter.value(idx).to_string();
                if !self.allowed.contains(&value) {
                    violations += 1;
                    if samples.len() < MAX_SAMPLES {
                        samples.insert(truncate_field(&value, MAX_SAMPLE_LENGTH));
                    }
                }
            }
        }
        debug!(checked, violations, "Allowed-value scan complete");

        let compliance = if checked == 0 {
            1.0
        } else {
            (checked - violations) as f64 / checked as f64
        };

        if violations == 0 {
            return Ok(ConstraintResult::success_with_metric(
                compliance,
                format!(
                    "all {checked} non-null values of '{}' are in {}",
                    self.column,
                    self.allowed_display()
                ),
            ));
        }

        let quoted: Vec<String> = samples.iter().map(|s| format!("'{s}'")).collect();
        Ok(ConstraintResult::failure_with_metric(
            compliance,
            format!(
                "observed {violations} of {checked} values of '{}' outside {} (e.g. {}), expected none",
                self.column,
                self.allowed_display(),
                quoted.join(", ")
            ),
        ))
    }

    fn name(&self) -> &str {
        "is_contained_in"
    }

    fn column(&self) -> Option<&str> {
        Some(&self.column)
    }

    fn description(&self) -> String {
        format!("is_contained_in({}, {})", self.column, self.allowed_display())
    }

    fn mode(&self) -> EvaluationMode {
        EvaluationMode::Scan
    }
}
