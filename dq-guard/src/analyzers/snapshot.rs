//! Immutable per-table collection of computed metrics.

use std::collections::BTreeMap;
use tracing::warn;

use super::errors::{AnalysisError, AnalyzerError};
use super::types::{Analyzer, Metric, MetricScope, MetricValue};
use crate::prelude::*;
use crate::reporter::MetricsReport;

/// Metrics computed for one table at one point in time.
///
/// A snapshot holds at most one metric per `(analyzer, scope)` pair and cannot be
/// modified once built. Snapshots carry no timestamp, so two analyses of the same
/// table compare equal. Use [`MetricsReport`] for the serialized form.
///
/// # Example
///
/// ```rust
/// use dq_guard::analyzers::{Analyzer, MetricScope, MetricSnapshot, MetricValue};
///
/// let snapshot = MetricSnapshot::builder("employees")
///     .metric(Analyzer::Size, MetricScope::Table, MetricValue::Count(3))
///     .metric(
///         Analyzer::Completeness,
///         MetricScope::column("first_name"),
///         MetricValue::Ratio(1.0),
///     )
///     .build();
///
/// assert_eq!(snapshot.value(Analyzer::Size, &MetricScope::Table), Some(3.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    table_name: String,
    columns: Vec<Column>,
    metrics: BTreeMap<(Analyzer, MetricScope), Metric>,
    errors: Vec<AnalysisError>,
}

impl MetricSnapshot {
    /// Starts building a snapshot for the given table.
    pub fn builder(table_name: impl Into<String>) -> SnapshotBuilder {
        SnapshotBuilder {
            snapshot: MetricSnapshot {
                table_name: table_name.into(),
                columns: Vec::new(),
                metrics: BTreeMap::new(),
                errors: Vec::new(),
            },
        }
    }

    /// Rebuilds a snapshot from a previously reported profile.
    ///
    /// Fails if an entry carries a value its metric kind cannot hold.
    pub fn from_report(report: &MetricsReport) -> Result<Self> {
        let mut builder = Self::builder(report.table_name.clone()).columns(report.columns.clone());
        for entry in &report.metrics {
            let value = MetricValue::from_parts(entry.metric_kind, entry.value).ok_or_else(|| {
                GuardError::Serialization(format!(
                    "invalid {:?} value {} for {}({})",
                    entry.metric_kind, entry.value, entry.analyzer, entry.scope
                ))
            })?;
            builder = builder.metric(entry.analyzer, entry.scope.clone(), value);
        }
        builder.snapshot.errors = report.errors.clone();
        Ok(builder.build())
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The profiled columns in schema order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a metric.
    pub fn metric(&self, analyzer: Analyzer, scope: &MetricScope) -> Option<&Metric> {
        self.metrics.get(&(analyzer, scope.clone()))
    }

    /// Looks up a metric value as a float.
    pub fn value(&self, analyzer: Analyzer, scope: &MetricScope) -> Option<f64> {
        self.metric(analyzer, scope).map(|m| m.value.as_f64())
    }

    /// Looks up a metric value, failing with [`GuardError::MissingMetric`] when absent.
    pub fn require(&self, analyzer: Analyzer, scope: &MetricScope) -> Result<f64> {
        self.value(analyzer, scope)
            .ok_or_else(|| GuardError::MissingMetric {
                analyzer: analyzer.to_string(),
                scope: scope.to_string(),
            })
    }

    /// Iterates over all metrics in `(analyzer, scope)` order.
    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.metrics.values()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Analyzer failures recorded while building the snapshot.
    pub fn errors(&self) -> &[AnalysisError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Accumulates metrics for a [`MetricSnapshot`].
#[derive(Debug)]
pub struct SnapshotBuilder {
    snapshot: MetricSnapshot,
}

impl SnapshotBuilder {
    /// Sets the profiled column list.
    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.snapshot.columns = columns;
        self
    }

    /// Adds a metric. The first metric for a pair wins; later ones are dropped.
    pub fn metric(mut self, analyzer: Analyzer, scope: MetricScope, value: MetricValue) -> Self {
        self.insert(analyzer, scope, value);
        self
    }

    pub(crate) fn insert(&mut self, analyzer: Analyzer, scope: MetricScope, value: MetricValue) {
        let key = (analyzer, scope);
        if self.snapshot.metrics.contains_key(&key) {
            warn!(
                table.name = %self.snapshot.table_name,
                analyzer = %key.0,
                scope = %key.1,
                "Duplicate metric ignored"
            );
            return;
        }
        let metric = Metric::new(key.0, key.1.clone(), value);
        self.snapshot.metrics.insert(key, metric);
    }

    pub(crate) fn record_error(
        &mut self,
        analyzer: Analyzer,
        column: &str,
        error: &AnalyzerError,
    ) {
        self.snapshot
            .errors
            .push(AnalysisError::new(analyzer, column, error));
    }

    pub fn build(self) -> MetricSnapshot {
        self.snapshot
    }
}
