//! Checks: named, levelled groups of constraints.

use std::sync::Arc;

use crate::constraints::{
    Assertion, ColumnsMatchConstraint, CompletenessConstraint, ConstraintSpec,
    ContainedInConstraint, LengthRangeConstraint, NumericRangeConstraint, SatisfiesConstraint,
    SizeConstraint, UniquenessConstraint,
};
use crate::core::{Constraint, Level};
use crate::prelude::*;

/// A named group of constraints evaluated together at one severity level.
///
/// Configured and derived checks are the same type and run through the same
/// evaluation path.
///
/// # Examples
///
/// ```rust
/// use dq_guard::constraints::Assertion;
/// use dq_guard::core::{Check, Level};
///
/// let check = Check::builder("employees_quality")
///     .level(Level::Error)
///     .has_size(Assertion::GreaterThan(0.0))
///     .is_complete("emp_no")
///     .is_unique("emp_no")
///     .is_contained_in("gender", ["M", "F"])
///     .build();
///
/// assert_eq!(check.constraints().len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Check {
    name: String,
    level: Level,
    description: Option<String>,
    constraints: Vec<Arc<dyn Constraint>>,
}

impl Check {
    pub fn builder(name: impl Into<String>) -> CheckBuilder {
        CheckBuilder::new(name)
    }

    /// The check used for tables without a configured one: an error-level
    /// `size > 0`.
    pub fn default_for(table_name: &str) -> Self {
        Check::builder(format!("{table_name}_default"))
            .level(Level::Error)
            .description("Table must not be empty")
            .has_size(Assertion::GreaterThan(0.0))
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The constraints in evaluation and reporting order.
    pub fn constraints(&self) -> &[Arc<dyn Constraint>] {
        &self.constraints
    }
}

/// Builder for [`Check`].
#[derive(Debug)]
pub struct CheckBuilder {
    name: String,
    level: Level,
    description: Option<String>,
    constraints: Vec<Arc<dyn Constraint>>,
}

impl CheckBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: Level::default(),
            description: None,
            constraints: Vec::new(),
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds any constraint.
    pub fn constraint(mut self, constraint: impl Constraint + 'static) -> Self {
        self.constraints.push(Arc::new(constraint));
        self
    }

    /// Adds an already shared constraint.
    pub fn arc_constraint(mut self, constraint: Arc<dyn Constraint>) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Builds a constraint from its declarative form and adds it.
    pub fn spec(self, spec: &ConstraintSpec) -> Result<Self> {
        let constraint = spec.build()?;
        Ok(self.arc_constraint(constraint))
    }

    /// Row count must satisfy `assertion`.
    pub fn has_size(self, assertion: Assertion) -> Self {
        self.constraint(SizeConstraint::new(assertion))
    }

    /// Column must have no nulls.
    pub fn is_complete(self, column: impl Into<String>) -> Self {
        self.constraint(CompletenessConstraint::complete(column))
    }

    /// Column completeness must be at least `threshold`.
    pub fn has_completeness(self, column: impl Into<String>, threshold: f64) -> Self {
        self.constraint(CompletenessConstraint::with_threshold(column, threshold))
    }

    /// Every row must have a distinct value.
    pub fn is_unique(self, column: impl Into<String>) -> Self {
        self.constraint(UniquenessConstraint::new(column))
    }

    /// Every non-null value must be in `allowed`.
    pub fn is_contained_in<I, S>(self, column: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraint(ContainedInConstraint::new(column, allowed))
    }

    /// Every row must satisfy a SQL boolean expression.
    ///
    /// Fails if the expression contains forbidden SQL.
    pub fn satisfies(
        self,
        expression: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self> {
        let constraint = SatisfiesConstraint::new(expression, description)?;
        Ok(self.constraint(constraint))
    }

    /// Column minimum and maximum must lie within `[min, max]`.
    pub fn has_numeric_range(self, column: impl Into<String>, min: f64, max: f64) -> Self {
        self.constraint(NumericRangeConstraint::new(column, min, max))
    }

    /// Every non-null row of the column must lie within `[min, max]`.
    pub fn has_numeric_range_per_row(
        self,
        column: impl Into<String>,
        min: f64,
        max: f64,
    ) -> Self {
        self.constraint(NumericRangeConstraint::new(column, min, max).per_row())
    }

    /// String lengths must lie within `[min, max]`.
    pub fn has_length_range(self, column: impl Into<String>, min: u64, max: u64) -> Self {
        self.constraint(LengthRangeConstraint::new(column, min, max))
    }

    /// The table columns must equal `columns`, in order.
    pub fn has_columns<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraint(ColumnsMatchConstraint::new(columns))
    }

    pub fn build(self) -> Check {
        Check {
            name: self.name,
            level: self.level,
            description: self.description,
            constraints: self.constraints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_check() {
        let check = Check::default_for("titles");
        assert_eq!(check.name(), "titles_default");
        assert_eq!(check.level(), Level::Error);
        assert_eq!(check.constraints().len(), 1);
        assert_eq!(check.constraints()[0].name(), "size");
        assert_eq!(check.constraints()[0].description(), "size greater than 0");
    }

    #[test]
    fn test_builder_keeps_order() {
        let check = Check::builder("salaries")
            .is_complete("salary")
            .has_numeric_range("salary", 30000.0, 200000.0)
            .satisfies("salary > 0", "positive salary")
            .unwrap()
            .build();

        let names: Vec<&str> = check.constraints().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["is_complete", "numeric_range", "satisfies"]);
        assert_eq!(check.level(), Level::Warning);
    }

    #[test]
    fn test_satisfies_rejects_forbidden_sql() {
        let result = Check::builder("bad").satisfies("1=1; DROP TABLE employees", "evil");
        assert!(matches!(result, Err(GuardError::SecurityError(_))));
    }
}
