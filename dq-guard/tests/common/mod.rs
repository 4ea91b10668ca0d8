//! HR fixtures shared by the integration tests.

#![allow(dead_code)]

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use dq_guard::table::Table;
use std::sync::Arc;

fn strings(values: &[Option<&str>]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

fn table(name: &str, schema: SchemaRef, columns: Vec<ArrayRef>) -> Table {
    let batch = RecordBatch::try_new(schema, columns).unwrap();
    Table::from_batch(name, batch).unwrap()
}

pub fn employees_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("emp_no", DataType::Int64, false),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("last_name", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
    ]))
}

/// `[(1, Alice, Lee, F), (2, Bob, Kim, M), (1, Eve, Ng, F)]`
pub fn employees_with_duplicate_key() -> Table {
    table(
        "employees",
        employees_schema(),
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 1])),
            strings(&[Some("Alice"), Some("Bob"), Some("Eve")]),
            strings(&[Some("Lee"), Some("Kim"), Some("Ng")]),
            strings(&[Some("F"), Some("M"), Some("F")]),
        ],
    )
}

/// Five employees; the fourth has no recorded gender.
pub fn employees() -> Table {
    table(
        "employees",
        employees_schema(),
        vec![
            Arc::new(Int64Array::from(vec![10001, 10002, 10003, 10004, 10005])),
            strings(&[
                Some("Georgi"),
                Some("Bezalel"),
                Some("Parto"),
                Some("Chirstian"),
                Some("Kyoichi"),
            ]),
            strings(&[
                Some("Facello"),
                Some("Simmel"),
                Some("Bamford"),
                Some("Koblick"),
                Some("Maliniak"),
            ]),
            strings(&[Some("M"), Some("F"), Some("M"), None, Some("M")]),
        ],
    )
}

pub fn empty_employees() -> Table {
    Table::empty("employees", employees_schema())
}

pub fn salaries() -> Table {
    table(
        "salaries",
        Arc::new(Schema::new(vec![
            Field::new("emp_no", DataType::Int64, false),
            Field::new("salary", DataType::Int64, false),
        ])),
        vec![
            Arc::new(Int64Array::from(vec![10001, 10001, 10002, 10003])),
            Arc::new(Int64Array::from(vec![30000, 45000, 95000, 60000])),
        ],
    )
}

pub fn departments() -> Table {
    table(
        "departments",
        Arc::new(Schema::new(vec![
            Field::new("dept_no", DataType::Utf8, false),
            Field::new("dept_name", DataType::Utf8, false),
        ])),
        vec![
            strings(&[Some("d001"), Some("d002"), Some("d003")]),
            strings(&[Some("Marketing"), Some("Finance"), Some("Human Resources")]),
        ],
    )
}

/// A table of `rows` rows with a single non-null key column.
pub fn table_with_rows(name: &str, rows: i64) -> Table {
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
    if rows == 0 {
        return Table::empty(name, schema);
    }
    table(name, schema, vec![Arc::new(Int64Array::from_iter_values(0..rows))])
}
