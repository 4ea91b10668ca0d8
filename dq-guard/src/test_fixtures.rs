//! HR schema tables used by unit tests.
//!
//! The tables are small and hand-written so expected metrics can be read off
//! directly.

use crate::table::Table;
use arrow::array::{ArrayRef, Date32Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

fn strings(values: &[&str]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

fn table(name: &str, schema: SchemaRef, columns: Vec<ArrayRef>) -> Table {
    let batch = RecordBatch::try_new(schema, columns).expect("fixture columns match schema");
    Table::from_batch(name, batch).expect("fixture batch matches schema")
}

fn employees_sample_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("emp_no", DataType::Int64, false),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("last_name", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
    ]))
}

/// Three employees where `emp_no` 1 appears twice.
pub fn employees_sample() -> Table {
    table(
        "employees",
        employees_sample_schema(),
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 1])),
            strings(&["Alice", "Bob", "Eve"]),
            strings(&["Lee", "Kim", "Ng"]),
            strings(&["F", "M", "F"]),
        ],
    )
}

/// The employees schema with no rows.
pub fn empty_employees() -> Table {
    Table::empty("employees", employees_sample_schema())
}

/// Five well-formed employees with the full column set.
pub fn employees() -> Table {
    let schema = Arc::new(Schema::new(vec![
        Field::new("emp_no", DataType::Int64, false),
        Field::new("birth_date", DataType::Date32, true),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("last_name", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
        Field::new("hire_date", DataType::Date32, true),
    ]));
    table(
        "employees",
        schema,
        vec![
            Arc::new(Int64Array::from(vec![10001, 10002, 10003, 10004, 10005])),
            Arc::new(Date32Array::from(vec![-2_000, -1_500, -3_100, -800, -2_750])),
            strings(&["Georgi", "Bezalel", "Parto", "Chirstian", "Kyoichi"]),
            strings(&["Facello", "Simmel", "Bamford", "Koblick", "Maliniak"]),
            Arc::new(StringArray::from(vec![
                Some("M"),
                Some("F"),
                Some("M"),
                None,
                Some("M"),
            ])),
            Arc::new(Date32Array::from(vec![5_900, 5_800, 6_100, 6_000, 6_500])),
        ],
    )
}

/// Salaries ranging from 30000 to 95000.
pub fn salaries() -> Table {
    let schema = Arc::new(Schema::new(vec![
        Field::new("emp_no", DataType::Int64, false),
        Field::new("salary", DataType::Int64, false),
        Field::new("from_date", DataType::Utf8, true),
        Field::new("to_date", DataType::Utf8, true),
    ]));
    table(
        "salaries",
        schema,
        vec![
            Arc::new(Int64Array::from(vec![10001, 10001, 10002, 10003])),
            Arc::new(Int64Array::from(vec![30000, 45000, 95000, 60000])),
            strings(&["1986-06-26", "1987-06-26", "1996-08-03", "1995-12-03"]),
            strings(&["1987-06-26", "9999-01-01", "9999-01-01", "9999-01-01"]),
        ],
    )
}

/// Departments with unique codes and names.
pub fn departments() -> Table {
    let schema = Arc::new(Schema::new(vec![
        Field::new("dept_no", DataType::Utf8, false),
        Field::new("dept_name", DataType::Utf8, false),
    ]));
    table(
        "departments",
        schema,
        vec![
            strings(&["d001", "d002", "d003"]),
            strings(&["Marketing", "Finance", "Human Resources"]),
        ],
    )
}
