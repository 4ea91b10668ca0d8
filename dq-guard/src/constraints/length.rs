//! String length range constraint.

use crate::analyzers::Analyzer;
use crate::core::{Constraint, ConstraintResult, EvaluationContext};
use crate::prelude::*;
use async_trait::async_trait;
use tracing::instrument;

/// Checks that a string column's shortest and longest values lie within
/// `[min, max]` characters. Reads the `min_length`/`max_length` metrics.
#[derive(Debug, Clone)]
pub struct LengthRangeConstraint {
    column: String,
    min: u64,
    max: u64,
}

impl LengthRangeConstraint {
    pub fn new(column: impl Into<String>, min: u64, max: u64) -> Self {
        Self {
            column: column.into(),
            min,
            max,
        }
    }

    pub fn bounds(&self) -> (u64, u64) {
        (self.min, self.max)
    }
}

#[async_trait]
impl Constraint for LengthRangeConstraint {
    #[instrument(skip(self, ctx), fields(constraint.column = %self.column, min = self.min, max = self.max))]
    async fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<ConstraintResult> {
        let shortest = ctx.column_metric(Analyzer::MinLength, &self.column)?;
        let longest = ctx.column_metric(Analyzer::MaxLength, &self.column)?;
        let passed = shortest >= self.min as f64 && longest <= self.max as f64;
        let message = format!(
            "observed lengths [{shortest}, {longest}] for '{}', expected within [{}, {}]",
            self.column, self.min, self.max
        );
        Ok(if passed {
            ConstraintResult::success(message)
        } else {
            ConstraintResult::failure(message)
        })
    }

    fn name(&self) -> &str {
        "length_range"
    }

    fn column(&self) -> Option<&str> {
        Some(&self.column)
    }

    fn description(&self) -> String {
        format!("length_range({}, {}, {})", self.column, self.min, self.max)
    }
}
