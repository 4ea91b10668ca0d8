//! Single-pass metric computation over a [`Table`].

use tracing::{debug, instrument, warn};

use super::snapshot::MetricSnapshot;
use super::state::{ratio, ColumnAccumulator};
use super::types::{Analyzer, MetricScope, MetricValue};
use crate::table::Table;

/// Computes every applicable metric of a table in one scan.
///
/// Each batch is visited once; every column's accumulator is updated during that
/// visit. The function never fails: an analyzer that cannot read a column is
/// recorded in [`MetricSnapshot::errors`] and the rest of the analysis proceeds.
///
/// Metrics produced:
///
/// - table: `size`, `completeness` (non-null cells over all cells)
/// - every column: `completeness`, `distinctness`, `count_distinct`
/// - numeric columns: `minimum`, `maximum`, `mean`, `standard_deviation`
/// - string columns: `min_length`, `max_length`, `uniqueness`
///
/// Ratios over an empty table are 0.
///
/// # Example
///
/// ```rust
/// use arrow::array::{Int64Array, RecordBatch};
/// use arrow::datatypes::{DataType, Field, Schema};
/// use dq_guard::analyzers::{analyze, Analyzer, MetricScope};
/// use dq_guard::table::Table;
/// use std::sync::Arc;
///
/// let schema = Arc::new(Schema::new(vec![Field::new("emp_no", DataType::Int64, true)]));
/// let batch = RecordBatch::try_new(
///     schema,
///     vec![Arc::new(Int64Array::from(vec![Some(1), Some(2), None, Some(1)]))],
/// )
/// .unwrap();
/// let table = Table::from_batch("employees", batch).unwrap();
///
/// let snapshot = analyze(&table);
/// let emp_no = MetricScope::column("emp_no");
/// assert_eq!(snapshot.value(Analyzer::Size, &MetricScope::Table), Some(4.0));
/// assert_eq!(snapshot.value(Analyzer::Completeness, &emp_no), Some(0.75));
/// assert_eq!(snapshot.value(Analyzer::CountDistinct, &emp_no), Some(2.0));
/// ```
#[instrument(skip(table), fields(table.name = %table.name(), table.rows = table.row_count()))]
pub fn analyze(table: &Table) -> MetricSnapshot {
    let columns = table.columns();
    let mut accumulators: Vec<ColumnAccumulator> = columns
        .iter()
        .map(|column| ColumnAccumulator::for_type(column.column_type))
        .collect();

    for batch in table.batches() {
        for ((column, accumulator), array) in columns
            .iter()
            .zip(accumulators.iter_mut())
            .zip(batch.columns())
        {
            accumulator.update(&column.name, array);
        }
    }

    let rows = table.row_count() as u64;
    let cells = rows * columns.len() as u64;
    let non_null_cells: u64 = accumulators.iter().map(ColumnAccumulator::non_null).sum();

    let mut builder = MetricSnapshot::builder(table.name()).columns(columns.to_vec());
    builder.insert(Analyzer::Size, MetricScope::Table, MetricValue::Count(rows));
    builder.insert(
        Analyzer::Completeness,
        MetricScope::Table,
        MetricValue::Ratio(ratio(non_null_cells, cells)),
    );

    for (column, accumulator) in columns.iter().zip(accumulators) {
        accumulator.finish(&column.name, rows, &mut builder);
    }

    let snapshot = builder.build();
    for error in snapshot.errors() {
        warn!(
            table.name = %table.name(),
            analyzer = %error.analyzer,
            column = %error.column,
            error = %error.error,
            "Analyzer skipped"
        );
    }
    debug!(
        metric_count = snapshot.len(),
        error_count = snapshot.errors().len(),
        "Analysis complete"
    );
    snapshot
}
