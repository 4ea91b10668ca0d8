//! CSV directory source.

use async_trait::async_trait;
use datafusion::prelude::{CsvReadOptions, SessionContext};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use super::{validate_table_name, TableSource};
use crate::prelude::*;

/// Options for reading CSV files.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether each file has a header row
    pub has_header: bool,
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Maximum records read for schema inference
    pub schema_infer_max_records: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            schema_infer_max_records: 1000,
        }
    }
}

/// Reads tables from a directory holding one `<table>.csv` file per table.
///
/// Schemas are inferred by DataFusion's CSV reader.
///
/// ```rust,no_run
/// use dq_guard::sources::{CsvSource, TableSource};
///
/// # async fn example() -> dq_guard::error::Result<()> {
/// let source = CsvSource::new("data/hr");
/// for name in source.discover()? {
///     let table = source.scan(&name).await?;
///     println!("{name}: {} rows", table.row_count());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
    options: CsvOptions,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_options(dir, CsvOptions::default())
    }

    pub fn with_options(dir: impl Into<PathBuf>, options: CsvOptions) -> Self {
        Self {
            dir: dir.into(),
            options,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `table_name`.
    pub fn path_for(&self, table_name: &str) -> PathBuf {
        self.dir.join(format!("{table_name}.csv"))
    }

    /// Lists the table names available in the directory, sorted.
    pub fn discover(&self) -> Result<Vec<String>> {
        let pattern = self.dir.join("*.csv");
        let pattern = pattern.to_str().ok_or_else(|| {
            GuardError::Configuration(format!(
                "CSV directory '{}' is not valid UTF-8",
                self.dir.display()
            ))
        })?;

        let entries = glob::glob(pattern).map_err(|e| {
            GuardError::Configuration(format!("Invalid glob pattern '{pattern}': {e}"))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| GuardError::Io(e.into()))?;
            if !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        debug!(dir = %self.dir.display(), tables = names.len(), "Discovered CSV tables");
        Ok(names)
    }
}

#[async_trait]
impl TableSource for CsvSource {
    #[instrument(skip(self), fields(table.name = %table_name, source.dir = %self.dir.display()))]
    async fn scan(&self, table_name: &str) -> Result<Table> {
        validate_table_name(table_name)?;

        let path = self.path_for(table_name);
        if !path.is_file() {
            return Err(GuardError::scan(
                table_name,
                format!("file '{}' does not exist", path.display()),
            ));
        }
        let path_str = path.to_str().ok_or_else(|| {
            GuardError::scan(
                table_name,
                format!("path '{}' is not valid UTF-8", path.display()),
            )
        })?;

        let read_options = CsvReadOptions::new()
            .has_header(self.options.has_header)
            .delimiter(self.options.delimiter)
            .schema_infer_max_records(self.options.schema_infer_max_records);

        let ctx = SessionContext::new();
        let df = ctx
            .read_csv(path_str, read_options)
            .await
            .map_err(|e| {
                GuardError::scan_with_source(table_name, "could not read CSV", Box::new(e))
            })?;
        let schema = df.schema().inner().clone();
        let batches = df
            .collect()
            .await
            .map_err(|e| {
                GuardError::scan_with_source(table_name, "could not parse CSV", Box::new(e))
            })?;

        let table = Table::try_new(table_name, schema, batches)?;
        info!(
            table.rows = table.row_count(),
            table.columns = table.columns().len(),
            "Scanned CSV table"
        );
        Ok(table)
    }

    fn description(&self) -> String {
        format!("csv directory {}", self.dir.display())
    }
}
