//! Declarative constraint definitions.
//!
//! [`ConstraintSpec`] is the serializable form of every constraint kind. Configured
//! checks are read from JSON into specs and derived checks are produced as specs;
//! both become constraints through [`ConstraintSpec::build`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constraints::{
    Assertion, ColumnsMatchConstraint, CompletenessConstraint, ContainedInConstraint,
    LengthRangeConstraint, NumericRangeConstraint, SatisfiesConstraint, SizeConstraint,
    UniquenessConstraint,
};
use crate::core::Constraint;
use crate::prelude::*;

/// A constraint in declarative form.
///
/// # Examples
///
/// ```rust
/// use dq_guard::constraints::ConstraintSpec;
///
/// let spec: ConstraintSpec = serde_json::from_str(
///     r#"{"type": "numeric_range", "column": "salary", "min": 30000, "max": 200000}"#,
/// )
/// .unwrap();
/// let constraint = spec.build().unwrap();
/// assert_eq!(constraint.description(), "numeric_range(salary, 30000, 200000)");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintSpec {
    Size {
        assertion: Assertion,
    },
    IsComplete {
        column: String,
        /// Minimum completeness; absent means 1.0
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<f64>,
    },
    IsUnique {
        column: String,
    },
    IsContainedIn {
        column: String,
        allowed: Vec<String>,
    },
    Satisfies {
        expression: String,
        description: String,
    },
    NumericRange {
        column: String,
        min: f64,
        max: f64,
        #[serde(default)]
        per_row: bool,
    },
    LengthRange {
        column: String,
        min: u64,
        max: u64,
    },
    ColumnsMatch {
        columns: Vec<String>,
    },
}

impl ConstraintSpec {
    /// Builds the constraint, validating its parameters.
    pub fn build(&self) -> Result<Arc<dyn Constraint>> {
        let constraint: Arc<dyn Constraint> = match self {
            ConstraintSpec::Size { assertion } => Arc::new(SizeConstraint::new(*assertion)),
            ConstraintSpec::IsComplete { column, threshold } => {
                let threshold = threshold.unwrap_or(1.0);
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(GuardError::Configuration(format!(
                        "completeness threshold for '{column}' must be within [0, 1], got {threshold}"
                    )));
                }
                Arc::new(CompletenessConstraint::with_threshold(column.clone(), threshold))
            }
            ConstraintSpec::IsUnique { column } => {
                Arc::new(UniquenessConstraint::new(column.clone()))
            }
            ConstraintSpec::IsContainedIn { column, allowed } => {
                if allowed.is_empty() {
                    return Err(GuardError::Configuration(format!(
                        "allowed set for '{column}' must not be empty"
                    )));
                }
                Arc::new(ContainedInConstraint::new(column.clone(), allowed.clone()))
            }
            ConstraintSpec::Satisfies {
                expression,
                description,
            } => Arc::new(SatisfiesConstraint::new(
                expression.clone(),
                description.clone(),
            )?),
            ConstraintSpec::NumericRange {
                column,
                min,
                max,
                per_row,
            } => {
                if min > max {
                    return Err(GuardError::Configuration(format!(
                        "numeric range for '{column}' has min {min} above max {max}"
                    )));
                }
                let constraint = NumericRangeConstraint::new(column.clone(), *min, *max);
                Arc::new(if *per_row { constraint.per_row() } else { constraint })
            }
            ConstraintSpec::LengthRange { column, min, max } => {
                if min > max {
                    return Err(GuardError::Configuration(format!(
                        "length range for '{column}' has min {min} above max {max}"
                    )));
                }
                Arc::new(LengthRangeConstraint::new(column.clone(), *min, *max))
            }
            ConstraintSpec::ColumnsMatch { columns } => {
                Arc::new(ColumnsMatchConstraint::new(columns.iter().cloned()))
            }
        };
        Ok(constraint)
    }

    /// The column the constraint applies to, if it has exactly one.
    pub fn column(&self) -> Option<&str> {
        match self {
            ConstraintSpec::IsComplete { column, .. }
            | ConstraintSpec::IsUnique { column }
            | ConstraintSpec::IsContainedIn { column, .. }
            | ConstraintSpec::NumericRange { column, .. }
            | ConstraintSpec::LengthRange { column, .. } => Some(column),
            ConstraintSpec::Size { .. }
            | ConstraintSpec::Satisfies { .. }
            | ConstraintSpec::ColumnsMatch { .. } => None,
        }
    }
}
