//! Report types and reporters.
//!
//! For every table a run produces a [`MetricsReport`] (when the table could be
//! profiled) and always a [`ValidationReport`]. A [`RunSummary`] closes the run.
//! Reporters receive these values and decide where they go.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::analyzers::{AnalysisError, Analyzer, MetricKind, MetricScope, MetricSnapshot};
use crate::core::{CheckStatus, ConstraintStatus, Level, ValidationResult};
use crate::prelude::*;

/// One metric in a [`MetricsReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub analyzer: Analyzer,
    pub scope: MetricScope,
    pub value: f64,
    pub metric_kind: MetricKind,
}

/// Serialized profile of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub table_name: String,
    pub timestamp: DateTime<Utc>,
    pub columns: Vec<Column>,
    pub metrics: Vec<MetricEntry>,
    pub errors: Vec<AnalysisError>,
}

impl MetricsReport {
    /// Reports `snapshot`, stamped with the current time.
    pub fn from_snapshot(snapshot: &MetricSnapshot) -> Self {
        Self {
            table_name: snapshot.table_name().to_string(),
            timestamp: Utc::now(),
            columns: snapshot.columns().to_vec(),
            metrics: snapshot
                .metrics()
                .map(|m| MetricEntry {
                    analyzer: m.analyzer,
                    scope: m.scope.clone(),
                    value: m.value.as_f64(),
                    metric_kind: m.kind(),
                })
                .collect(),
            errors: snapshot.errors().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintReport {
    pub description: String,
    pub status: ConstraintStatus,
    pub message: String,
    pub metric: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub check_name: String,
    pub level: Level,
    pub status: CheckStatus,
    pub constraints: Vec<ConstraintReport>,
}

/// Serialized validation outcome of one table.
///
/// A degraded report stands in for a table that could not be validated at all;
/// it has no check results, an error status and a set `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub table_name: String,
    pub timestamp: DateTime<Utc>,
    pub overall_status: CheckStatus,
    pub check_results: Vec<CheckReport>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ValidationReport {
    /// Report for a table whose validation could not run.
    pub fn degraded(table_name: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            table_name: table_name.into(),
            timestamp: Utc::now(),
            overall_status: CheckStatus::Error,
            check_results: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    fn constraints(&self) -> impl Iterator<Item = &ConstraintReport> {
        self.check_results.iter().flat_map(|c| c.constraints.iter())
    }
}

impl From<&ValidationResult> for ValidationReport {
    fn from(result: &ValidationResult) -> Self {
        let check_results = result
            .check_results
            .iter()
            .map(|check| CheckReport {
                check_name: check.check_name.clone(),
                level: check.level,
                status: check.status,
                constraints: check
                    .constraint_results
                    .iter()
                    .map(|r| ConstraintReport {
                        description: r.description.clone(),
                        status: r.status,
                        message: r.message.clone(),
                        metric: r.metric,
                    })
                    .collect(),
            })
            .collect();

        Self {
            table_name: result.table_name.clone(),
            timestamp: result.timestamp,
            overall_status: result.status,
            check_results,
            error: None,
        }
    }
}

/// Per-table line of a [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub status: CheckStatus,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    #[serde(default)]
    pub error: Option<String>,
}

impl From<&ValidationReport> for TableSummary {
    fn from(report: &ValidationReport) -> Self {
        let total = report.constraints().count();
        let passed = report
            .constraints()
            .filter(|c| c.status.is_success())
            .count();
        Self {
            status: report.overall_status,
            total,
            passed,
            failed: total - passed,
            error: report.error.clone(),
        }
    }
}

/// Outcome of a whole pipeline run, keyed by table name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub tables: BTreeMap<String, TableSummary>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            tables: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, report: &ValidationReport) {
        self.tables
            .insert(report.table_name.clone(), TableSummary::from(report));
    }

    /// The most severe table status; success for an empty run.
    pub fn overall_status(&self) -> CheckStatus {
        self.tables
            .values()
            .map(|t| t.status)
            .max()
            .unwrap_or(CheckStatus::Success)
    }

    pub fn is_success(&self) -> bool {
        self.overall_status() == CheckStatus::Success
    }

    /// Names of tables that could not be validated.
    pub fn degraded_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|(_, t)| t.error.is_some())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives the reports of a run.
#[async_trait]
pub trait ResultReporter: Debug + Send + Sync {
    async fn report_metrics(&self, report: &MetricsReport) -> Result<()>;

    async fn report_validation(&self, report: &ValidationReport) -> Result<()>;

    async fn report_summary(&self, _summary: &RunSummary) -> Result<()> {
        Ok(())
    }
}

/// Writes pretty-printed JSON files into an output directory:
/// `<table>_metrics.json`, `<table>_validation.json` and `run_summary.json`.
#[derive(Debug, Clone)]
pub struct JsonFileReporter {
    output_dir: PathBuf,
}

impl JsonFileReporter {
    /// The directory is created on first write.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File name for a table's report; characters unsafe in file names become `_`.
    pub fn file_name(table_name: &str, suffix: &str) -> String {
        let stem: String = table_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{stem}_{suffix}.json")
    }

    #[instrument(skip(self, value), fields(output.dir = %self.output_dir.display()))]
    async fn write_json<T: Serialize + Sync>(&self, file_name: &str, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(file_name);
        let json = serde_json::to_string_pretty(value)?;
        tokio::fs::write(&path, json).await?;
        debug!(path = %path.display(), "Wrote report");
        Ok(())
    }
}

#[async_trait]
impl ResultReporter for JsonFileReporter {
    async fn report_metrics(&self, report: &MetricsReport) -> Result<()> {
        self.write_json(&Self::file_name(&report.table_name, "metrics"), report)
            .await
    }

    async fn report_validation(&self, report: &ValidationReport) -> Result<()> {
        self.write_json(&Self::file_name(&report.table_name, "validation"), report)
            .await
    }

    async fn report_summary(&self, summary: &RunSummary) -> Result<()> {
        self.write_json("run_summary.json", summary).await
    }
}

/// Keeps every report in memory, in arrival order.
#[derive(Debug, Default)]
pub struct InMemoryReporter {
    metrics: RwLock<Vec<MetricsReport>>,
    validations: RwLock<Vec<ValidationReport>>,
    summaries: RwLock<Vec<RunSummary>>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn metrics_reports(&self) -> Vec<MetricsReport> {
        self.metrics.read().await.clone()
    }

    pub async fn validation_reports(&self) -> Vec<ValidationReport> {
        self.validations.read().await.clone()
    }

    /// The most recent validation report for `table_name`.
    pub async fn validation_for(&self, table_name: &str) -> Option<ValidationReport> {
        self.validations
            .read()
            .await
            .iter()
            .rev()
            .find(|r| r.table_name == table_name)
            .cloned()
    }

    pub async fn summaries(&self) -> Vec<RunSummary> {
        self.summaries.read().await.clone()
    }
}

#[async_trait]
impl ResultReporter for InMemoryReporter {
    async fn report_metrics(&self, report: &MetricsReport) -> Result<()> {
        self.metrics.write().await.push(report.clone());
        Ok(())
    }

    async fn report_validation(&self, report: &ValidationReport) -> Result<()> {
        self.validations.write().await.push(report.clone());
        Ok(())
    }

    async fn report_summary(&self, summary: &RunSummary) -> Result<()> {
        self.summaries.write().await.push(summary.clone());
        Ok(())
    }
}
