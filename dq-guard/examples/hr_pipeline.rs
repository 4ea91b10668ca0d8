//! Validates a small HR dataset end to end.
//!
//! Profiles the tables, applies configured checks and derived expectations, and
//! prints each table's outcome. One table is registered as unreadable to show
//! how a scan failure is isolated.
//!
//! Run with `cargo run --example hr_pipeline`. Set `RUST_LOG=dq_guard=debug` for
//! per-constraint logs.

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use dq_guard::config::ValidationConfig;
use dq_guard::derivation::DerivationPolicy;
use dq_guard::logging::setup::{init_logging, LoggingConfig};
use dq_guard::logging::LogConfig;
use dq_guard::pipeline::{PipelineMode, ValidationPipeline};
use dq_guard::reporter::InMemoryReporter;
use dq_guard::sources::MemorySource;
use dq_guard::table::Table;
use std::sync::Arc;

const CONFIG: &str = r#"{
    "tables": {
        "employees": {
            "check_name": "employees_quality",
            "level": "error",
            "constraints": [
                {"type": "is_complete", "column": "emp_no"},
                {"type": "is_unique", "column": "emp_no"},
                {"type": "is_contained_in", "column": "gender", "allowed": ["M", "F"]},
                {"type": "satisfies", "expression": "emp_no >= 10001", "description": "issued id"}
            ]
        }
    }
}"#;

fn employees() -> Result<Table, Box<dyn std::error::Error>> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("emp_no", DataType::Int64, false),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![10001, 10002, 10003, 10004])),
            Arc::new(StringArray::from(vec!["Georgi", "Bezalel", "Parto", "Chirstian"])),
            Arc::new(StringArray::from(vec![Some("M"), Some("F"), Some("M"), None])),
        ],
    )?;
    Ok(Table::from_batch("employees", batch)?)
}

fn salaries() -> Result<Table, Box<dyn std::error::Error>> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("emp_no", DataType::Int64, false),
        Field::new("salary", DataType::Int64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![10001, 10001, 10002, 10003])),
            Arc::new(Int64Array::from(vec![60117, 62102, 65828, 40006])),
        ],
    )?;
    Ok(Table::from_batch("salaries", batch)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::development())?;

    let source = MemorySource::new()
        .with_table(employees()?)
        .with_table(salaries()?)
        .with_failure("titles", "titles extract has not landed yet");
    let reporter = Arc::new(InMemoryReporter::new());

    let pipeline = ValidationPipeline::builder(Arc::new(source), reporter.clone())
        .config(ValidationConfig::from_json_str(CONFIG)?)
        .mode(PipelineMode::Derived(
            DerivationPolicy::with_tolerance(0.1).completeness_floor(0.7),
        ))
        .log_config(LogConfig::verbose())
        .build()?;

    let summary = pipeline.run(&["employees", "salaries", "titles"]).await;

    for report in reporter.validation_reports().await {
        println!("{} -> {}", report.table_name, report.overall_status);
        if let Some(error) = &report.error {
            println!("  not validated: {error}");
        }
        for check in &report.check_results {
            println!("  {} ({}): {}", check.check_name, check.level, check.status);
            for constraint in &check.constraints {
                println!(
                    "    [{:?}] {}: {}",
                    constraint.status, constraint.description, constraint.message
                );
            }
        }
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
