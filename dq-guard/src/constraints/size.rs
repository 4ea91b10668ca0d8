//! Size constraint for checking row counts.

use crate::analyzers::{Analyzer, MetricScope};
use crate::constraints::Assertion;
use crate::core::{Constraint, ConstraintResult, EvaluationContext};
use crate::prelude::*;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Checks the table's row count against an assertion.
///
/// Reads the `size` metric; never scans the table.
///
/// # Examples
///
/// ```rust
/// use dq_guard::constraints::{Assertion, SizeConstraint};
/// use dq_guard::core::Constraint;
///
/// let constraint = SizeConstraint::new(Assertion::Between(1000.0, 10000.0));
/// assert_eq!(constraint.name(), "size");
/// assert_eq!(constraint.description(), "size between 1000 and 10000");
/// ```
#[derive(Debug, Clone)]
pub struct SizeConstraint {
    assertion: Assertion,
}

impl SizeConstraint {
    pub fn new(assertion: Assertion) -> Self {
        Self { assertion }
    }

    pub fn assertion(&self) -> Assertion {
        self.assertion
    }
}

#[async_trait]
impl Constraint for SizeConstraint {
    #[instrument(skip(self, ctx), fields(constraint.name = %self.name(), constraint.assertion = %self.assertion))]
    async fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<ConstraintResult> {
        let size = ctx.metric(Analyzer::Size, &MetricScope::Table)?;
        let passed = self.assertion.evaluate(size);
        debug!(size, passed, "Size constraint evaluated");

        Ok(ConstraintResult::from_check(
            passed,
            size,
            format!("observed size {size}, expected {}", self.assertion),
        ))
    }

    fn name(&self) -> &str {
        "size"
    }

    fn description(&self) -> String {
        format!("size {}", self.assertion)
    }
}
