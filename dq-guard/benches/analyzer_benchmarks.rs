//! Benchmarks for single-pass profiling and check evaluation.

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dq_guard::analyzers::analyze;
use dq_guard::core::{evaluate, Check};
use dq_guard::derivation::{derive, DerivationPolicy};
use dq_guard::table::Table;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

const BATCH_ROWS: usize = 8192;

/// An employees-shaped table with `rows` rows split into fixed-size batches.
fn employees(rows: usize) -> Table {
    let schema = Arc::new(Schema::new(vec![
        Field::new("emp_no", DataType::Int64, false),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
        Field::new("salary", DataType::Float64, true),
    ]));

    let batches = (0..rows)
        .step_by(BATCH_ROWS)
        .map(|start| {
            let end = (start + BATCH_ROWS).min(rows);
            let ids: ArrayRef = Arc::new(Int64Array::from_iter_values(
                (start..end).map(|i| 10001 + i as i64),
            ));
            let names: ArrayRef = Arc::new(StringArray::from_iter(
                (start..end).map(|i| (i % 17 != 0).then(|| format!("name_{}", i % 1000))),
            ));
            let genders: ArrayRef = Arc::new(StringArray::from_iter_values(
                (start..end).map(|i| if i % 2 == 0 { "M" } else { "F" }),
            ));
            let salaries: ArrayRef = Arc::new(Float64Array::from_iter(
                (start..end).map(|i| (i % 29 != 0).then(|| 30000.0 + (i % 65000) as f64)),
            ));
            RecordBatch::try_new(schema.clone(), vec![ids, names, genders, salaries]).unwrap()
        })
        .collect();

    Table::try_new("employees", schema, batches).unwrap()
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    group.measurement_time(Duration::from_secs(10));

    for rows in [10_000, 100_000, 1_000_000] {
        let table = employees(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| analyze(black_box(table)));
        });
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let table = employees(100_000);
    let snapshot = analyze(&table);

    let aggregate = Check::builder("aggregate")
        .is_complete("emp_no")
        .is_unique("emp_no")
        .has_numeric_range("salary", 0.0, 200_000.0)
        .build();
    let row_level = Check::builder("row_level")
        .is_contained_in("gender", ["M", "F"])
        .has_numeric_range_per_row("salary", 0.0, 200_000.0)
        .build();
    let derived = derive(&snapshot, &DerivationPolicy::with_tolerance(0.1))
        .unwrap()
        .check;

    let mut group = c.benchmark_group("evaluate");
    for (name, check) in [
        ("aggregate", &aggregate),
        ("row_level", &row_level),
        ("derived", &derived),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| rt.block_on(evaluate(black_box(&table), black_box(&snapshot), check)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_analyze, bench_evaluate);
criterion_main!(benches);
