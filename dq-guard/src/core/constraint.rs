//! Constraint trait and related types for validation rules.

use crate::core::EvaluationContext;
use crate::prelude::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The status of a constraint evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintStatus {
    /// The constraint check passed
    Success,
    /// The constraint check failed, or could not be evaluated
    Failure,
}

impl ConstraintStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ConstraintStatus::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ConstraintStatus::Failure)
    }
}

/// The result of evaluating a constraint.
///
/// The message always states what was observed and what was expected, so a
/// failure can be diagnosed from the result alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintResult {
    /// Description of the constraint that produced this result
    pub description: String,
    /// The status of the constraint evaluation
    pub status: ConstraintStatus,
    /// The observed metric, when the constraint compares one
    pub metric: Option<f64>,
    /// Observed versus expected
    pub message: String,
}

impl ConstraintResult {
    /// Creates a successful result without a metric.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            status: ConstraintStatus::Success,
            metric: None,
            message: message.into(),
        }
    }

    /// Creates a successful result carrying the observed metric.
    pub fn success_with_metric(metric: f64, message: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            status: ConstraintStatus::Success,
            metric: Some(metric),
            message: message.into(),
        }
    }

    /// Creates a failed result without a metric.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            status: ConstraintStatus::Failure,
            metric: None,
            message: message.into(),
        }
    }

    /// Creates a failed result carrying the observed metric.
    pub fn failure_with_metric(metric: f64, message: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            status: ConstraintStatus::Failure,
            metric: Some(metric),
            message: message.into(),
        }
    }

    /// Creates a success or failure result depending on `passed`.
    pub fn from_check(passed: bool, metric: f64, message: impl Into<String>) -> Self {
        if passed {
            Self::success_with_metric(metric, message)
        } else {
            Self::failure_with_metric(metric, message)
        }
    }

    /// Sets the constraint description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Whether a constraint reads the metric snapshot or scans the table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    /// Answered from precomputed metrics or the schema
    Aggregate,
    /// Requires a pass over the rows
    Scan,
}

/// A validation rule that can be evaluated against a table and its metrics.
///
/// Implementations are stateless and can be shared between checks and tables.
/// Errors returned from [`evaluate`](Constraint::evaluate) never escape the
/// engine: they are turned into a failed [`ConstraintResult`].
#[async_trait]
pub trait Constraint: Debug + Send + Sync {
    /// Evaluates the constraint.
    async fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<ConstraintResult>;

    /// Returns the kind name of the constraint, e.g. `is_unique`.
    fn name(&self) -> &str;

    /// Returns the column this constraint operates on (if single-column).
    fn column(&self) -> Option<&str> {
        None
    }

    /// Returns a human-readable description including the constraint's parameters.
    fn description(&self) -> String;

    /// Returns how the constraint obtains its data.
    fn mode(&self) -> EvaluationMode {
        EvaluationMode::Aggregate
    }
}
