//! Row-level SQL predicate constraint.

use crate::core::{Constraint, ConstraintResult, EvaluationContext, EvaluationMode};
use crate::prelude::*;
use arrow::array::AsArray;
use arrow::datatypes::Int64Type;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::instrument;

/// Compiled keyword patterns, keyed by pattern text.
static REGEX_CACHE: Lazy<RwLock<HashMap<String, Regex>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

const FORBIDDEN_KEYWORDS: &[&str] = &[
    "DROP",
    "DELETE",
    "INSERT",
    "UPDATE",
    "CREATE",
    "ALTER",
    "TRUNCATE",
    "GRANT",
    "REVOKE",
    "EXECUTE",
    "EXEC",
    "CALL",
    "MERGE",
    "RENAME",
    "COPY",
    "SET",
    "COMMIT",
    "ROLLBACK",
    "BEGIN",
    "TRANSACTION",
];

/// Checks that every row satisfies a SQL boolean expression.
///
/// The expression is evaluated by DataFusion against the table. Rows where it is
/// false or NULL violate the constraint. Expressions containing statements
/// (DDL/DML keywords), `;` or comments are rejected at construction.
///
/// # Examples
///
/// ```rust
/// use dq_guard::constraints::SatisfiesConstraint;
/// use dq_guard::core::Constraint;
///
/// let constraint = SatisfiesConstraint::new("salary > 0", "positive salary").unwrap();
/// assert_eq!(constraint.description(), "satisfies(positive salary: salary > 0)");
///
/// assert!(SatisfiesConstraint::new("1 = 1; DROP TABLE salaries", "nope").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SatisfiesConstraint {
    expression: String,
    description: String,
}

impl SatisfiesConstraint {
    /// Creates the constraint after screening the expression.
    pub fn new(expression: impl Into<String>, description: impl Into<String>) -> Result<Self> {
        let expression = expression.into();
        validate_sql_expression(&expression)?;
        Ok(Self {
            expression,
            description: description.into(),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

fn keyword_regex(keyword: &str) -> Result<Regex> {
    let pattern = format!(r"\b{keyword}\b");
    {
        let cache = REGEX_CACHE
            .read()
            .map_err(|_| GuardError::Internal("regex cache lock poisoned".to_string()))?;
        if let Some(regex) = cache.get(&pattern) {
            return Ok(regex.clone());
        }
    }

    let regex = Regex::new(&pattern)
        .map_err(|e| GuardError::Internal(format!("Failed to compile regex pattern: {e}")))?;
    let mut cache = REGEX_CACHE
        .write()
        .map_err(|_| GuardError::Internal("regex cache lock poisoned".to_string()))?;
    cache.insert(pattern, regex.clone());
    Ok(regex)
}

/// Rejects expressions that could do more than read the table.
pub fn validate_sql_expression(sql: &str) -> Result<()> {
    if sql.trim().is_empty() {
        return Err(GuardError::Configuration(
            "SQL expression cannot be empty".to_string(),
        ));
    }

    let sql_upper = sql.to_uppercase();
    for keyword in FORBIDDEN_KEYWORDS {
        if keyword_regex(keyword)?.is_match(&sql_upper) {
            return Err(GuardError::SecurityError(format!(
                "SQL expression contains forbidden operation: {keyword}"
            )));
        }
    }

    if sql.contains(';') {
        return Err(GuardError::SecurityError(
            "SQL expression cannot contain semicolons".to_string(),
        ));
    }

    if sql.contains("--") || sql.contains("/*") || sql.contains("*/") {
        return Err(GuardError::SecurityError(
            "SQL expression cannot contain comments".to_string(),
        ));
    }

    Ok(())
}

#[async_trait]
impl Constraint for SatisfiesConstraint {
    #[instrument(skip(self, ctx), fields(expression = %self.expression))]
    async fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<ConstraintResult> {
        let session = ctx.session().await?;
        let sql = format!(
            "SELECT COUNT(CASE WHEN ({}) THEN 1 END) AS satisfied, COUNT(*) AS total FROM {}",
            self.expression,
            ctx.sql_table_name()
        );

        let df = match session.sql(&sql).await {
            Ok(df) => df,
            Err(e) => {
                return Ok(ConstraintResult::failure(format!(
                    "SQL expression error: {e}. Expression: '{}'",
                    self.expression
                )))
            }
        };
        let batches = match df.collect().await {
            Ok(batches) => batches,
            Err(e) => {
                return Ok(ConstraintResult::failure(format!(
                    "SQL execution error: {e}. Expression: '{}'",
                    self.expression
                )))
            }
        };

        let batch = batches
            .iter()
            .find(|b| b.num_rows() > 0)
            .ok_or_else(|| GuardError::Internal("aggregate query returned no rows".to_string()))?;
        let count = |idx: usize| -> Result<i64> {
            batch
                .column(idx)
                .as_primitive_opt::<Int64Type>()
                .map(|a| a.value(0))
                .ok_or_else(|| GuardError::Internal("Failed to extract row counts".to_string()))
        };
        let satisfied = count(0)?;
        let total = count(1)?;

        if total == 0 {
            return Ok(ConstraintResult::success_with_metric(
                1.0,
                "no rows to check",
            ));
        }

        let ratio = satisfied as f64 / total as f64;
        let violations = total - satisfied;
        Ok(ConstraintResult::from_check(
            violations == 0,
            ratio,
            format!(
                "observed {violations} of {total} rows violating '{}', expected none",
                self.expression
            ),
        ))
    }

    fn name(&self) -> &str {
        "satisfies"
    }

    fn description(&self) -> String {
        format!("satisfies({}: {})", self.description, self.expression)
    }

    fn mode(&self) -> EvaluationMode {
        EvaluationMode::Scan
    }
}
