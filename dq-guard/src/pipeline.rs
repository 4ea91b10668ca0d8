//! End-to-end validation of many tables.
//!
//! For each table the pipeline scans it, profiles it, evaluates its checks and
//! reports the outcome. Tables are independent: each runs in its own tokio task,
//! and a table whose scan fails, or whose task panics, still gets a degraded
//! [`ValidationReport`] while the others complete normally.
//!
//! ```rust,no_run
//! use dq_guard::config::ValidationConfig;
//! use dq_guard::pipeline::ValidationPipeline;
//! use dq_guard::reporter::JsonFileReporter;
//! use dq_guard::sources::CsvSource;
//! use std::sync::Arc;
//!
//! # async fn example() -> dq_guard::error::Result<()> {
//! let source = Arc::new(CsvSource::new("data/hr"));
//! let tables = source.discover()?;
//!
//! let pipeline = ValidationPipeline::builder(source, Arc::new(JsonFileReporter::new("out")))
//!     .config(ValidationConfig::from_path("dq.json")?)
//!     .max_concurrent_tables(4)
//!     .build()?;
//!
//! let summary = pipeline.run(&tables).await;
//! println!("overall: {}", summary.overall_status());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn, Instrument};

use crate::analyzers::{analyze, MetricSnapshot};
use crate::config::ValidationConfig;
use crate::core::{Check, ValidationSuite};
use crate::derivation::{DerivationPolicy, ExpectationDeriver};
use crate::log_table_op;
use crate::prelude::*;
use crate::reporter::{MetricsReport, ResultReporter, RunSummary, ValidationReport};
use crate::sources::TableSource;

/// Where a table's checks come from.
///
/// Without an explicit mode the pipeline derives when the configuration carries a
/// `derivation` policy, and runs configured checks only otherwise.
#[derive(Debug, Clone, Default)]
pub enum PipelineMode {
    /// The configured check, or the default check for unconfigured tables.
    #[default]
    Configured,
    /// The configured (or default) check plus a check derived under the policy.
    ///
    /// Expectations are derived from the table's baseline snapshot when one is
    /// registered, otherwise from the profile of the data being validated.
    Derived(DerivationPolicy),
}

/// Shared per-run state handed to every table task.
struct Shared {
    source: Arc<dyn TableSource>,
    reporter: Arc<dyn ResultReporter>,
    config: ValidationConfig,
    deriver: Option<ExpectationDeriver>,
    baselines: HashMap<String, MetricSnapshot>,
    log_config: LogConfig,
}

/// Validates tables from a [`TableSource`] and hands the reports to a
/// [`ResultReporter`].
pub struct ValidationPipeline {
    shared: Arc<Shared>,
    limit: Arc<Semaphore>,
}

impl ValidationPipeline {
    pub fn builder(
        source: Arc<dyn TableSource>,
        reporter: Arc<dyn ResultReporter>,
    ) -> ValidationPipelineBuilder {
        ValidationPipelineBuilder {
            source,
            reporter,
            config: ValidationConfig::default(),
            mode: None,
            baselines: HashMap::new(),
            log_config: LogConfig::default(),
            max_concurrent_tables: DEFAULT_MAX_CONCURRENT_TABLES,
        }
    }

    /// Validates every named table and reports the run summary.
    ///
    /// Never fails: every table yields a validation report, degraded if the table
    /// could not be validated. Reporter errors are logged and do not stop the run.
    #[instrument(skip(self, tables), fields(tables = tables.len()))]
    pub async fn run<S: AsRef<str>>(&self, tables: &[S]) -> RunSummary {
        info!(
            source = %self.shared.source.description(),
            tables = tables.len(),
            "Starting validation run"
        );

        let handles: Vec<_> = tables
            .iter()
            .map(|name| {
                let name = name.as_ref().to_string();
                let shared = Arc::clone(&self.shared);
                let limit = Arc::clone(&self.limit);
                let task_name = name.clone();
                let handle = tokio::spawn(
                    async move {
                        let _permit = limit.acquire_owned().await.ok();
                        validate_table(&shared, &task_name).await
                    }
                    .in_current_span(),
                );
                (name, handle)
            })
            .collect();

        let mut summary = RunSummary::new();
        for (name, handle) in handles {
            let report = match handle.await {
                Ok(report) => report,
                Err(e) => {
                    error!(table.name = %name, error = %e, "Validation task failed");
                    ValidationReport::degraded(&name, format!("validation task failed: {e}"))
                }
            };
            if let Err(e) = self.shared.reporter.report_validation(&report).await {
                warn!(table.name = %name, error = %e, "Failed to report validation");
            }
            summary.record(&report);
        }

        if let Err(e) = self.shared.reporter.report_summary(&summary).await {
            warn!(error = %e, "Failed to report run summary");
        }
        info!(
            status = %summary.overall_status(),
            tables = summary.tables.len(),
            degraded = summary.degraded_tables().len(),
            "Validation run completed"
        );
        summary
    }
}

const DEFAULT_MAX_CONCURRENT_TABLES: usize = 8;

#[instrument(skip(shared), fields(table.name = %table_name))]
async fn validate_table(shared: &Shared, table_name: &str) -> ValidationReport {
    let table = match shared.source.scan(table_name).await {
        Ok(table) => table,
        Err(e) => {
            warn!(error = %e, "Table scan failed");
            return ValidationReport::degraded(table_name, e);
        }
    };
    log_table_op!(
        shared.log_config,
        table.rows = table.row_count(),
        table.columns = table.columns().len(),
        "Scanned table"
    );

    let snapshot = analyze(&table);
    if shared.log_config.log_metrics {
        info!(
            metrics = snapshot.len(),
            analysis.errors = snapshot.errors().len(),
            "Profiled table"
        );
    }
    if let Err(e) = shared
        .reporter
        .report_metrics(&MetricsReport::from_snapshot(&snapshot))
        .await
    {
        warn!(error = %e, "Failed to report metrics");
    }

    let checks = match checks_for(shared, &table, &snapshot) {
        Ok(checks) => checks,
        Err(e) => {
            warn!(error = %e, "Could not build checks");
            return ValidationReport::degraded(table_name, e);
        }
    };

    let suite = ValidationSuite::builder(format!("{table_name}_suite"))
        .checks(checks)
        .log_config(shared.log_config.clone())
        .build();
    let result = suite.run(&table, &snapshot).await;
    ValidationReport::from(&result)
}

fn checks_for(shared: &Shared, table: &Table, snapshot: &MetricSnapshot) -> Result<Vec<Check>> {
    let mut checks = vec![shared.config.check_for(table.name())?];
    if let Some(deriver) = &shared.deriver {
        let baseline = shared.baselines.get(table.name()).unwrap_or(snapshot);
        let derivation = deriver.derive(baseline)?;
        for skipped in &derivation.skipped {
            warn!(table.name = %table.name(), "{skipped}");
        }
        checks.push(derivation.check);
    }
    Ok(checks)
}

/// Builder for [`ValidationPipeline`].
pub struct ValidationPipelineBuilder {
    source: Arc<dyn TableSource>,
    reporter: Arc<dyn ResultReporter>,
    config: ValidationConfig,
    mode: Option<PipelineMode>,
    baselines: HashMap<String, MetricSnapshot>,
    log_config: LogConfig,
    max_concurrent_tables: usize,
}

impl ValidationPipelineBuilder {
    pub fn config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the mode implied by the configuration's derivation policy.
    pub fn mode(mut self, mode: PipelineMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Registers a baseline profile to derive the table's expectations from.
    pub fn baseline(mut self, snapshot: MetricSnapshot) -> Self {
        self.baselines
            .insert(snapshot.table_name().to_string(), snapshot);
        self
    }

    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Maximum number of tables validated at once, clamped to `1..=64`.
    pub fn max_concurrent_tables(mut self, max: usize) -> Self {
        self.max_concurrent_tables = max.clamp(1, 64);
        self
    }

    /// Validates the configuration and builds the pipeline.
    pub fn build(self) -> Result<ValidationPipeline> {
        self.config.validate()?;
        let mode = self.mode.unwrap_or_else(|| match &self.config.derivation {
            Some(policy) => PipelineMode::Derived(policy.clone()),
            None => PipelineMode::Configured,
        });
        let deriver = match mode {
            PipelineMode::Configured => None,
            PipelineMode::Derived(policy) => Some(ExpectationDeriver::new(policy)?),
        };

        Ok(ValidationPipeline {
            shared: Arc::new(Shared {
                source: self.source,
                reporter: self.reporter,
                config: self.config,
                deriver,
                baselines: self.baselines,
                log_config: self.log_config,
            }),
            limit: Arc::new(Semaphore::new(self.max_concurrent_tables)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CheckStatus;
    use crate::reporter::InMemoryReporter;
    use crate::sources::MemorySource;
    use crate::test_fixtures::{departments, employees_sample, salaries};

    fn pipeline(
        source: MemorySource,
        reporter: Arc<InMemoryReporter>,
        mode: PipelineMode,
    ) -> ValidationPipeline {
        ValidationPipeline::builder(Arc::new(source), reporter)
            .mode(mode)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_default_checks_for_unconfigured_tables() {
        let reporter = Arc::new(InMemoryReporter::new());
        let source = MemorySource::new()
            .with_table(departments())
            .with_table(salaries());
        let summary = pipeline(source, reporter.clone(), PipelineMode::Configured)
            .run(&["departments", "salaries"])
            .await;

        assert!(summary.is_success());
        assert_eq!(summary.tables["salaries"].total, 1);
        assert_eq!(reporter.metrics_reports().await.len(), 2);
        assert_eq!(reporter.summaries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_failure_is_isolated() {
        let reporter = Arc::new(InMemoryReporter::new());
        let source = MemorySource::new()
            .with_table(departments())
            .with_failure("salaries", "disk unplugged");
        let summary = pipeline(source, reporter.clone(), PipelineMode::Configured)
            .run(&["salaries", "departments"])
            .await;

        let failed = reporter.validation_for("salaries").await.unwrap();
        assert!(failed.is_degraded());
        assert!(failed.error.unwrap().contains("disk unplugged"));

        let ok = reporter.validation_for("departments").await.unwrap();
        assert_eq!(ok.overall_status, CheckStatus::Success);
        assert_eq!(summary.degraded_tables(), vec!["salaries"]);
        // no profile for a table that was never read
        assert_eq!(reporter.metrics_reports().await.len(), 1);
    }

    #[tokio::test]
    async fn test_derived_mode_adds_derived_check() {
        let reporter = Arc::new(InMemoryReporter::new());
        let source = MemorySource::new().with_table(employees_sample());
        pipeline(
            source,
            reporter.clone(),
            PipelineMode::Derived(DerivationPolicy::with_tolerance(0.1)),
        )
        .run(&["employees"])
        .await;

        let report = reporter.validation_for("employees").await.unwrap();
        let names: Vec<&str> = report
            .check_results
            .iter()
            .map(|c| c.check_name.as_str())
            .collect();
        assert_eq!(names, vec!["employees_default", "employees_derived"]);
        assert_eq!(report.overall_status, CheckStatus::Success);
    }

    #[tokio::test]
    async fn test_baseline_drives_derivation() {
        let baseline = MetricSnapshot::builder("salaries")
            .metric(
                crate::analyzers::Analyzer::Size,
                crate::analyzers::MetricScope::Table,
                crate::analyzers::MetricValue::Count(100),
            )
            .build();
        let reporter = Arc::new(InMemoryReporter::new());
        let pipeline = ValidationPipeline::builder(
            Arc::new(MemorySource::new().with_table(salaries())),
            reporter.clone(),
        )
        .mode(PipelineMode::Derived(
            DerivationPolicy::with_tolerance(0.1).derive_schema(false),
        ))
        .baseline(baseline)
        .build()
        .unwrap();

        let summary = pipeline.run(&["salaries"]).await;
        // 4 rows against a baseline of 100 +/- 10%
        assert_eq!(summary.tables["salaries"].failed, 1);
        assert_eq!(summary.tables["salaries"].status, CheckStatus::Warning);
    }

    #[tokio::test]
    async fn test_config_derivation_policy_enables_derivation() {
        let config =
            ValidationConfig::from_json_str(r#"{"derivation": {"tolerance": 0.1}}"#).unwrap();
        let source = || MemorySource::new().with_table(salaries());

        let reporter = Arc::new(InMemoryReporter::new());
        ValidationPipeline::builder(Arc::new(source()), reporter.clone())
            .config(config.clone())
            .build()
            .unwrap()
            .run(&["salaries"])
            .await;
        let report = reporter.validation_for("salaries").await.unwrap();
        let names: Vec<&str> = report
            .check_results
            .iter()
            .map(|c| c.check_name.as_str())
            .collect();
        assert_eq!(names, vec!["salaries_default", "salaries_derived"]);

        let reporter = Arc::new(InMemoryReporter::new());
        ValidationPipeline::builder(Arc::new(source()), reporter.clone())
            .config(config)
            .mode(PipelineMode::Configured)
            .build()
            .unwrap()
            .run(&["salaries"])
            .await;
        let report = reporter.validation_for("salaries").await.unwrap();
        assert_eq!(report.check_results.len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected_at_build() {
        let config =
            ValidationConfig::new().with_derivation(DerivationPolicy::with_tolerance(-1.0));
        let result = ValidationPipeline::builder(
            Arc::new(MemorySource::new()),
            Arc::new(InMemoryReporter::new()),
        )
        .config(config)
        .build();
        assert!(result.is_err());
    }
}
