//! Immutable table view handed from a source to the analyzers and constraints.
//!
//! A [`Table`] is a named set of Arrow record batches sharing one schema. It is
//! never mutated after construction; clones share the underlying batches.

use crate::prelude::*;
use arrow::array::{ArrayRef, RecordBatch};
use arrow::datatypes::{DataType, SchemaRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Broad type category used to select analyzers for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Integer, floating point and decimal columns
    Numeric,
    /// UTF-8 string columns
    String,
    /// Boolean columns
    Boolean,
    /// Anything else (dates, timestamps, binary, nested types)
    Other,
}

impl ColumnType {
    /// Maps an Arrow data type onto its column category.
    pub fn from_arrow(data_type: &DataType) -> Self {
        match data_type {
            dt if dt.is_numeric() => ColumnType::Numeric,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => ColumnType::String,
            DataType::Boolean => ColumnType::Boolean,
            _ => ColumnType::Other,
        }
    }

    /// Returns the string representation of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::String => "string",
            ColumnType::Boolean => "boolean",
            ColumnType::Other => "other",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A column descriptor: name, inferred type and nullability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name as it appears in the schema
    pub name: String,
    /// Inferred type category
    pub column_type: ColumnType,
    /// Whether the schema allows nulls
    pub nullable: bool,
}

impl Column {
    /// Creates a new column descriptor.
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable,
        }
    }
}

/// A named, read-only table backed by Arrow record batches.
///
/// # Examples
///
/// ```rust
/// use arrow::array::{Int64Array, RecordBatch};
/// use arrow::datatypes::{DataType, Field, Schema};
/// use dq_guard::table::{ColumnType, Table};
/// use std::sync::Arc;
///
/// let schema = Arc::new(Schema::new(vec![Field::new("emp_no", DataType::Int64, false)]));
/// let batch = RecordBatch::try_new(
///     schema.clone(),
///     vec![Arc::new(Int64Array::from(vec![10001, 10002]))],
/// )
/// .unwrap();
///
/// let table = Table::try_new("employees", schema, vec![batch]).unwrap();
/// assert_eq!(table.row_count(), 2);
/// assert_eq!(table.columns()[0].column_type, ColumnType::Numeric);
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    name: Arc<str>,
    schema: SchemaRef,
    columns: Arc<[Column]>,
    batches: Arc<[RecordBatch]>,
}

impl Table {
    /// Creates a table from a schema and its batches.
    ///
    /// Every batch must have the same column count and column types as the schema.
    pub fn try_new(
        name: impl Into<Arc<str>>,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<Self> {
        let name = name.into();
        for (idx, batch) in batches.iter().enumerate() {
            let batch_schema = batch.schema();
            let compatible = batch_schema.fields().len() == schema.fields().len()
                && batch_schema
                    .fields()
                    .iter()
                    .zip(schema.fields().iter())
                    .all(|(a, b)| a.data_type() == b.data_type());
            if !compatible {
                return Err(GuardError::scan(
                    name.to_string(),
                    format!("batch {idx} does not match the table schema"),
                ));
            }
        }

        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                Column::new(
                    field.name().clone(),
                    ColumnType::from_arrow(field.data_type()),
                    field.is_nullable(),
                )
            })
            .collect::<Vec<_>>();

        Ok(Self {
            name,
            schema,
            columns: columns.into(),
            batches: batches.into(),
        })
    }

    /// Creates a table from a single batch, using the batch's own schema.
    pub fn from_batch(name: impl Into<Arc<str>>, batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        Self::try_new(name, schema, vec![batch])
    }

    /// Creates a table with the given schema and no rows.
    pub fn empty(name: impl Into<Arc<str>>, schema: SchemaRef) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                Column::new(
                    field.name().clone(),
                    ColumnType::from_arrow(field.data_type()),
                    field.is_nullable(),
                )
            })
            .collect::<Vec<_>>();
        Self {
            name: name.into(),
            schema,
            columns: columns.into(),
            batches: Arc::from(Vec::new()),
        }
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the Arrow schema.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Returns the ordered column descriptors.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column names in schema order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Looks up a column descriptor and its position by name.
    pub fn column(&self, name: &str) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.name == name)
    }

    /// Returns the record batches.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Returns the total number of rows across all batches.
    pub fn row_count(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Iterates over the arrays of one column, batch by batch.
    ///
    /// Fails with [`GuardError::ColumnNotFound`] for unknown column names.
    pub fn column_arrays(&self, name: &str) -> Result<impl Iterator<Item = &ArrayRef> + '_> {
        let (index, _) = self.column(name).ok_or_else(|| GuardError::ColumnNotFound {
            column: name.to_string(),
        })?;
        Ok(self.batches.iter().map(move |batch| batch.column(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Date32Array, Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{Field, Schema};

    fn mixed_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("emp_no", DataType::Int32, false),
            Field::new("salary", DataType::Float64, true),
            Field::new("first_name", DataType::Utf8, true),
            Field::new("active", DataType::Boolean, true),
            Field::new("hire_date", DataType::Date32, true),
        ]))
    }

    fn mixed_batch(schema: &SchemaRef) -> RecordBatch {
        RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![1, 2])),
                Arc::new(Float64Array::from(vec![Some(1.0), None])),
                Arc::new(StringArray::from(vec![Some("Alice"), Some("Bob")])),
                Arc::new(BooleanArray::from(vec![Some(true), None])),
                Arc::new(Date32Array::from(vec![Some(1), Some(2)])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_column_types_inferred_from_schema() {
        let schema = mixed_schema();
        let table = Table::try_new("mixed", schema.clone(), vec![mixed_batch(&schema)]).unwrap();

        let types: Vec<ColumnType> = table.columns().iter().map(|c| c.column_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Numeric,
                ColumnType::Numeric,
                ColumnType::String,
                ColumnType::Boolean,
                ColumnType::Other,
            ]
        );
        assert!(!table.columns()[0].nullable);
        assert!(table.columns()[1].nullable);
    }

    #[test]
    fn test_row_count_spans_batches() {
        let schema = mixed_schema();
        let table = Table::try_new(
            "mixed",
            schema.clone(),
            vec![mixed_batch(&schema), mixed_batch(&schema)],
        )
        .unwrap();
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.column_arrays("salary").unwrap().count(), 2);
    }

    #[test]
    fn test_unknown_column() {
        let table = Table::empty("mixed", mixed_schema());
        assert_eq!(table.row_count(), 0);
        assert!(matches!(
            table.column_arrays("nope"),
            Err(GuardError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_mismatched_batch_rejected() {
        let other = Arc::new(Schema::new(vec![Field::new("x", DataType::Utf8, true)]));
        let batch = RecordBatch::try_new(
            other,
            vec![Arc::new(StringArray::from(vec![Some("a")]))],
        )
        .unwrap();

        let err = Table::try_new("mixed", mixed_schema(), vec![batch]).unwrap_err();
        assert!(err.is_scan_error());
    }
}
