//! Schema constraint: the table has exactly the expected columns, in order.

use crate::core::{Constraint, ConstraintResult, EvaluationContext};
use crate::prelude::*;
use async_trait::async_trait;

/// Checks that the table's column names equal an ordered list.
#[derive(Debug, Clone)]
pub struct ColumnsMatchConstraint {
    columns: Vec<String>,
}

impl ColumnsMatchConstraint {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

#[async_trait]
impl Constraint for ColumnsMatchConstraint {
    async fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<ConstraintResult> {
        let observed = ctx.table().column_names();
        if observed == self.columns {
            return Ok(ConstraintResult::success_with_metric(
                observed.len() as f64,
                format!("observed columns match the expected {}", self.columns.len()),
            ));
        }

        let missing: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| !observed.contains(c))
            .map(String::as_str)
            .collect();
        let unexpected: Vec<&str> = observed
            .iter()
            .filter(|c| !self.columns.contains(c))
            .map(String::as_str)
            .collect();

        let detail = if missing.is_empty() && unexpected.is_empty() {
            "same columns in a different order".to_string()
        } else {
            format!(
                "missing [{}], unexpected [{}]",
                missing.join(", "),
                unexpected.join(", ")
            )
        };
        Ok(ConstraintResult::failure_with_metric(
            observed.len() as f64,
            format!(
                "observed columns [{}], expected [{}]: {detail}",
                observed.join(", "),
                self.columns.join(", ")
            ),
        ))
    }

    fn name(&self) -> &str {
        "columns_match"
    }

    fn description(&self) -> String {
        format!("columns_match({})", self.columns.join(", "))
    }
}
