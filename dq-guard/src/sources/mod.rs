//! Table sources.
//!
//! A [`TableSource`] turns a table name into a materialized [`Table`]. Sources
//! report every read or parse problem as [`GuardError::Scan`], which the pipeline
//! isolates to the affected table.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::{debug, instrument};

use crate::prelude::*;

mod csv;

pub use csv::{CsvOptions, CsvSource};

/// Provides tables by name.
///
/// # Examples
///
/// ```rust
/// use dq_guard::sources::{MemorySource, TableSource};
/// use dq_guard::table::Table;
/// use arrow::datatypes::{DataType, Field, Schema};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let schema = Arc::new(Schema::new(vec![Field::new("dept_no", DataType::Utf8, false)]));
/// let source = MemorySource::new().with_table(Table::empty("departments", schema));
///
/// let table = source.scan("departments").await.unwrap();
/// assert_eq!(table.row_count(), 0);
/// assert!(source.scan("titles").await.is_err());
/// # }
/// ```
#[async_trait]
pub trait TableSource: Debug + Send + Sync {
    /// Reads the named table in full.
    async fn scan(&self, table_name: &str) -> Result<Table>;

    /// Returns a human-readable description of this source.
    fn description(&self) -> String;
}

/// Rejects names that could escape a source's namespace.
pub(crate) fn validate_table_name(table_name: &str) -> Result<()> {
    let valid = !table_name.is_empty()
        && table_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(GuardError::scan(
            table_name,
            "table names may only contain ASCII letters, digits, '_' and '-'",
        ))
    }
}

/// Serves tables registered in memory.
///
/// A table can also be registered as failing, in which case scanning it returns
/// a scan error with the given message.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: BTreeMap<String, Table>,
    failures: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table under its own name, replacing any previous one.
    pub fn with_table(mut self, table: Table) -> Self {
        self.insert(table);
        self
    }

    /// Makes scans of `table_name` fail with `message`.
    pub fn with_failure(
        mut self,
        table_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.failures.insert(table_name.into(), message.into());
        self
    }

    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name().to_string(), table);
    }

    /// Names of the registered tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}

#[async_trait]
impl TableSource for MemorySource {
    #[instrument(skip(self), fields(table.name = %table_name))]
    async fn scan(&self, table_name: &str) -> Result<Table> {
        if let Some(message) = self.failures.get(table_name) {
            return Err(GuardError::scan(table_name, message.clone()));
        }
        let table = self
            .tables
            .get(table_name)
            .cloned()
            .ok_or_else(|| GuardError::scan(table_name, "table is not registered"))?;
        debug!(table.rows = table.row_count(), "Scanned in-memory table");
        Ok(table)
    }

    fn description(&self) -> String {
        format!("memory ({} tables)", self.tables.len())
    }
}
