//! Error types for the analyzer framework.
//!
//! Analyzer errors are never propagated out of [`analyze`](super::analyze). They are
//! recorded in the resulting snapshot and the affected analyzers are skipped.

use thiserror::Error;

use super::types::Analyzer;

/// Result type for analyzer operations.
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Errors that can occur while computing metrics for a column.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// A column could not be read in the representation an analyzer needs.
    #[error("Cannot read column '{column}': {message}")]
    UnreadableColumn { column: String, message: String },

    /// Arrow computation error (casts, formatting).
    #[error("Arrow computation failed: {0}")]
    ArrowComputation(#[from] arrow::error::ArrowError),

    /// A metric could not be derived from the accumulated state.
    #[error("Failed to compute metric: {0}")]
    MetricComputation(String),
}

impl AnalyzerError {
    pub fn unreadable_column(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnreadableColumn {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn metric_computation(msg: impl Into<String>) -> Self {
        Self::MetricComputation(msg.into())
    }
}

/// An analyzer failure recorded in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisError {
    /// The analyzer that was skipped
    pub analyzer: Analyzer,
    /// The column it was skipped for
    pub column: String,
    /// Rendered error message
    pub error: String,
}

impl AnalysisError {
    pub fn new(analyzer: Analyzer, column: impl Into<String>, error: &AnalyzerError) -> Self {
        Self {
            analyzer,
            column: column.into(),
            error: error.to_string(),
        }
    }
}
