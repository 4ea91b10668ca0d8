//! Error types for the dq-guard library.
//!
//! All fallible operations outside the analyzer framework return [`GuardError`].
//! The analyzer framework has its own [`AnalyzerError`](crate::analyzers::AnalyzerError)
//! because analyzer failures are recorded in the snapshot instead of propagated.

use thiserror::Error;

/// The main error type for the dq-guard library.
#[derive(Error, Debug)]
pub enum GuardError {
    /// A table could not be read or parsed by its source.
    #[error("Failed to scan table '{table}': {message}")]
    Scan {
        /// Name of the table that could not be scanned
        table: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A constraint could not be evaluated against the data.
    #[error("Constraint evaluation failed for '{constraint}': {message}")]
    ConstraintEvaluation {
        /// Name of the constraint that failed to evaluate
        constraint: String,
        /// Detailed error message
        message: String,
    },

    /// A metric needed by a constraint is not present in the snapshot.
    #[error("Metric {analyzer}({scope}) is not available")]
    MissingMetric {
        /// Analyzer that should have produced the metric
        analyzer: String,
        /// Scope of the missing metric
        scope: String,
    },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error when a required column is not found in the table.
    #[error("Column '{column}' not found in table")]
    ColumnNotFound { column: String },

    /// A SQL expression contains a forbidden construct.
    #[error("Security error: {0}")]
    SecurityError(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, GuardError>`.
pub type Result<T> = std::result::Result<T, GuardError>;

impl GuardError {
    /// Creates a new scan error for the given table.
    pub fn scan(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scan {
            table: table.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new scan error wrapping the underlying cause.
    pub fn scan_with_source(
        table: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Scan {
            table: table.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a new constraint evaluation error.
    pub fn constraint_evaluation(
        constraint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConstraintEvaluation {
            constraint: constraint.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error means the table itself could not be read.
    pub fn is_scan_error(&self) -> bool {
        matches!(self, Self::Scan { .. })
    }
}

impl From<serde_json::Error> for GuardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<GuardError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            GuardError::Internal(inner) => GuardError::Internal(format!("{msg}: {inner}")),
            other => GuardError::Internal(format!("{msg}: {other}")),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            match e.into() {
                GuardError::Internal(inner) => GuardError::Internal(format!("{msg}: {inner}")),
                other => GuardError::Internal(format!("{msg}: {other}")),
            }
        })
    }
}
