//! Metric computation for tables.
//!
//! The analyzer engine profiles a [`Table`](crate::table::Table) in a single pass and
//! returns an immutable [`MetricSnapshot`]. Which analyzers run for a column is
//! decided once from its [`ColumnType`](crate::table::ColumnType):
//!
//! | column type | analyzers |
//! |-------------|-----------|
//! | any | completeness, distinctness, count_distinct |
//! | numeric | + minimum, maximum, mean, standard_deviation |
//! | string | + min_length, max_length, uniqueness |
//!
//! plus the table-wide `size` and `completeness`.
//!
//! Snapshots feed both the constraint engine and the expectation deriver.

pub mod errors;
pub mod runner;
pub mod snapshot;
pub(crate) mod state;
pub mod types;

pub use errors::{AnalysisError, AnalyzerError, AnalyzerResult};
pub use runner::analyze;
pub use snapshot::{MetricSnapshot, SnapshotBuilder};
pub use types::{Analyzer, Metric, MetricKind, MetricScope, MetricValue};
