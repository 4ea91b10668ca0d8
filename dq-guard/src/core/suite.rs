//! Evaluation of checks against a table and its metric snapshot.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::analyzers::MetricSnapshot;
use crate::core::{
    Check, CheckResult, Constraint, ConstraintResult, EvaluationContext, ValidationResult,
};
use crate::log_constraint;
use crate::prelude::*;

/// Evaluates one check.
///
/// All constraints of the check run concurrently over the same immutable table and
/// snapshot; results come back in constraint order. A constraint that returns an
/// error becomes a failed result describing the error.
///
/// # Examples
///
/// ```rust
/// use arrow::array::{Int64Array, RecordBatch};
/// use arrow::datatypes::{DataType, Field, Schema};
/// use dq_guard::analyzers::analyze;
/// use dq_guard::core::{evaluate, Check, CheckStatus, Level};
/// use dq_guard::table::Table;
/// use std::sync::Arc;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let schema = Arc::new(Schema::new(vec![Field::new("emp_no", DataType::Int64, false)]));
/// let batch = RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1, 2, 1]))]).unwrap();
/// let table = Table::from_batch("employees", batch).unwrap();
/// let snapshot = analyze(&table);
///
/// let check = Check::builder("keys").level(Level::Error).is_unique("emp_no").build();
/// let result = evaluate(&table, &snapshot, &check).await;
/// assert_eq!(result.status, CheckStatus::Error);
/// # })
/// ```
pub async fn evaluate(table: &Table, snapshot: &MetricSnapshot, check: &Check) -> CheckResult {
    let ctx = EvaluationContext::new(table, snapshot);
    evaluate_with_context(&ctx, check, &LogConfig::default()).await
}

#[instrument(
    skip(ctx, check, log_config),
    fields(table.name = %ctx.table().name(), check.name = %check.name(), check.level = %check.level())
)]
async fn evaluate_with_context(
    ctx: &EvaluationContext<'_>,
    check: &Check,
    log_config: &LogConfig,
) -> CheckResult {
    debug!(
        check.constraints = check.constraints().len(),
        "Evaluating check"
    );

    let results = join_all(
        check
            .constraints()
            .iter()
            .map(|constraint| evaluate_constraint(ctx, constraint, log_config)),
    )
    .await;

    let result = CheckResult::new(check.name(), check.level(), results);
    debug!(
        check.status = %result.status,
        check.passed = result.passed_count(),
        check.failed = result.failed_count(),
        "Check evaluated"
    );
    result
}

async fn evaluate_constraint(
    ctx: &EvaluationContext<'_>,
    constraint: &Arc<dyn Constraint>,
    log_config: &LogConfig,
) -> ConstraintResult {
    let description = constraint.description();
    let result = match constraint.evaluate(ctx).await {
        Ok(result) => result,
        Err(e) => {
            warn!(
                constraint.name = %constraint.name(),
                constraint.column = ?constraint.column(),
                error = %e,
                "Constraint evaluation failed"
            );
            ConstraintResult::failure(format!("Evaluation error: {e}"))
        }
    };
    log_constraint!(
        log_config,
        constraint.name = %constraint.name(),
        constraint.status = ?result.status,
        constraint.metric = ?result.metric,
        message = %crate::logging::truncate_field(&result.message, log_config.max_field_length),
        "Constraint evaluated"
    );
    result.with_description(description)
}

/// An ordered set of checks run against one table.
///
/// All checks share one evaluation context, so row-scanning constraints register
/// the table with DataFusion at most once per run.
#[derive(Debug, Clone)]
pub struct ValidationSuite {
    name: String,
    checks: Vec<Check>,
    log_config: LogConfig,
}

impl ValidationSuite {
    pub fn builder(name: impl Into<String>) -> ValidationSuiteBuilder {
        ValidationSuiteBuilder {
            name: name.into(),
            checks: Vec::new(),
            log_config: LogConfig::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Evaluates every check and aggregates the overall status.
    pub async fn run(&self, table: &Table, snapshot: &MetricSnapshot) -> ValidationResult {
        info!(
            suite.name = %self.name,
            suite.checks = self.checks.len(),
            table.name = %table.name(),
            "Starting validation suite"
        );

        let ctx = EvaluationContext::new(table, snapshot);
        let mut check_results = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            check_results.push(evaluate_with_context(&ctx, check, &self.log_config).await);
        }

        let result = ValidationResult::new(table.name(), check_results);
        info!(
            suite.name = %self.name,
            table.name = %table.name(),
            validation.status = %result.status,
            validation.passed = result.passed_constraints(),
            validation.failed = result.failed_constraints(),
            "Validation suite completed"
        );
        result
    }
}

/// Builder for [`ValidationSuite`].
#[derive(Debug)]
pub struct ValidationSuiteBuilder {
    name: String,
    checks: Vec<Check>,
    log_config: LogConfig,
}

impl ValidationSuiteBuilder {
    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn checks<I>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = Check>,
    {
        self.checks.extend(checks);
        self
    }

    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn build(self) -> ValidationSuite {
        ValidationSuite {
            name: self.name,
            checks: self.checks,
            log_config: self.log_config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyze;
    use crate::constraints::Assertion;
    use crate::core::{CheckStatus, ConstraintStatus, Level};
    use crate::test_fixtures::{employees_sample, empty_employees};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct BrokenConstraint;

    #[async_trait]
    impl Constraint for BrokenConstraint {
        async fn evaluate(&self, _ctx: &EvaluationContext<'_>) -> Result<ConstraintResult> {
            Err(GuardError::constraint_evaluation("broken", "cannot evaluate"))
        }

        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> String {
            "always errors".to_string()
        }
    }

    #[tokio::test]
    async fn test_employees_sample_check() {
        let table = employees_sample();
        let snapshot = analyze(&table);
        let check = Check::builder("employees")
            .level(Level::Error)
            .is_complete("first_name")
            .is_contained_in("gender", ["M", "F"])
            .is_unique("emp_no")
            .build();

        let result = evaluate(&table, &snapshot, &check).await;
        let statuses: Vec<ConstraintStatus> =
            result.constraint_results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ConstraintStatus::Success,
                ConstraintStatus::Success,
                ConstraintStatus::Failure,
            ]
        );
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.constraint_results[2].description, "is_unique(emp_no)");
    }

    #[tokio::test]
    async fn test_constraint_error_becomes_failure() {
        let table = employees_sample();
        let snapshot = analyze(&table);
        let check = Check::builder("mixed")
            .constraint(BrokenConstraint)
            .has_size(Assertion::Equals(3.0))
            .build();

        let result = evaluate(&table, &snapshot, &check).await;
        assert_eq!(result.status, CheckStatus::Warning);
        let broken = &result.constraint_results[0];
        assert_eq!(broken.status, ConstraintStatus::Failure);
        assert_eq!(broken.description, "always errors");
        assert!(broken.message.contains("cannot evaluate"));
        assert!(result.constraint_results[1].status.is_success());
    }

    #[tokio::test]
    async fn test_suite_overall_status() {
        let table = empty_employees();
        let snapshot = analyze(&table);
        let suite = ValidationSuite::builder("empty")
            .check(
                Check::builder("soft")
                    .level(Level::Warning)
                    .is_complete("emp_no")
                    .build(),
            )
            .check(Check::default_for("employees"))
            .build();

        let result = suite.run(&table, &snapshot).await;
        assert_eq!(result.table_name, "employees");
        assert_eq!(result.check_results.len(), 2);
        assert_eq!(result.check_results[0].status, CheckStatus::Warning);
        assert_eq!(result.check_results[1].status, CheckStatus::Error);
        assert_eq!(result.status, CheckStatus::Error);
    }
}
