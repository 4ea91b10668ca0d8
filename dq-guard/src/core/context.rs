//! The data a constraint is evaluated against.

use datafusion::common::TableReference;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::analyzers::{Analyzer, MetricScope, MetricSnapshot};
use crate::prelude::*;

/// Read-only view of one table and its metrics during constraint evaluation.
///
/// Constraints answered from aggregates read the [`MetricSnapshot`]. Constraints
/// that scan rows with SQL share one DataFusion session, created on first use and
/// kept for the lifetime of the context.
pub struct EvaluationContext<'a> {
    table: &'a Table,
    snapshot: &'a MetricSnapshot,
    session: OnceCell<SessionContext>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(table: &'a Table, snapshot: &'a MetricSnapshot) -> Self {
        Self {
            table,
            snapshot,
            session: OnceCell::new(),
        }
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn snapshot(&self) -> &'a MetricSnapshot {
        self.snapshot
    }

    /// Reads a metric, failing with [`GuardError::MissingMetric`] when absent.
    pub fn metric(&self, analyzer: Analyzer, scope: &MetricScope) -> Result<f64> {
        self.snapshot.require(analyzer, scope)
    }

    /// Reads a column metric after checking the column exists in the table.
    pub fn column_metric(&self, analyzer: Analyzer, column: &str) -> Result<f64> {
        if self.table.column(column).is_none() {
            return Err(GuardError::ColumnNotFound {
                column: column.to_string(),
            });
        }
        self.metric(analyzer, &MetricScope::column(column))
    }

    /// The table name quoted for use in SQL.
    pub fn sql_table_name(&self) -> String {
        quote_identifier(self.table.name())
    }

    /// Returns the session with this table registered, creating it on first call.
    pub async fn session(&self) -> Result<&SessionContext> {
        self.session
            .get_or_try_init(|| async {
                debug!(table.name = %self.table.name(), "Registering table for SQL evaluation");
                let ctx = SessionContext::new();
                let provider = MemTable::try_new(
                    self.table.schema().clone(),
                    vec![self.table.batches().to_vec()],
                )?;
                ctx.register_table(TableReference::bare(self.table.name()), Arc::new(provider))?;
                Ok::<_, GuardError>(ctx)
            })
            .await
    }
}

/// Quotes an identifier for DataFusion SQL, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
