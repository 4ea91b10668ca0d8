//! Numeric assertions used by size and other threshold constraints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An assertion that can be evaluated against a numeric value.
///
/// Serialized in snake_case, e.g. `{"greater_than": 0}` or `{"between": [90, 110]}`.
///
/// # Examples
///
/// ```rust
/// use dq_guard::constraints::Assertion;
///
/// assert!(Assertion::GreaterThan(0.0).evaluate(5.0));
/// assert!(Assertion::Between(90.0, 110.0).evaluate(100.0));
/// assert!(!Assertion::NotBetween(90.0, 110.0).evaluate(100.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assertion {
    /// Equal within 1e-10
    Equals(f64),
    NotEquals(f64),
    GreaterThan(f64),
    GreaterThanOrEqual(f64),
    LessThan(f64),
    LessThanOrEqual(f64),
    /// Inclusive on both ends
    Between(f64, f64),
    NotBetween(f64, f64),
}

impl Assertion {
    /// Evaluates the assertion against a value.
    pub fn evaluate(&self, value: f64) -> bool {
        const EPSILON: f64 = 1e-10;

        match *self {
            Assertion::Equals(expected) => (value - expected).abs() < EPSILON,
            Assertion::NotEquals(expected) => (value - expected).abs() >= EPSILON,
            Assertion::GreaterThan(threshold) => value > threshold,
            Assertion::GreaterThanOrEqual(threshold) => value >= threshold,
            Assertion::LessThan(threshold) => value < threshold,
            Assertion::LessThanOrEqual(threshold) => value <= threshold,
            Assertion::Between(min, max) => value >= min && value <= max,
            Assertion::NotBetween(min, max) => value < min || value > max,
        }
    }

    /// Returns a human-readable description of the assertion.
    pub fn description(&self) -> String {
        match self {
            Assertion::Equals(v) => format!("equal to {v}"),
            Assertion::NotEquals(v) => format!("not equal to {v}"),
            Assertion::GreaterThan(v) => format!("greater than {v}"),
            Assertion::GreaterThanOrEqual(v) => format!("at least {v}"),
            Assertion::LessThan(v) => format!("less than {v}"),
            Assertion::LessThanOrEqual(v) => format!("at most {v}"),
            Assertion::Between(min, max) => format!("between {min} and {max}"),
            Assertion::NotBetween(min, max) => format!("not between {min} and {max}"),
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
