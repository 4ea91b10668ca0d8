//! # dq-guard - Data Profiling and Validation for Rust
//!
//! dq-guard profiles tabular data in a single pass, validates it against
//! declarative constraints and derives new constraints from a profile. Tables are
//! Arrow record batches; row-level SQL predicates run on DataFusion.
//!
//! ## Overview
//!
//! A validation run has three stages:
//!
//! 1. **Profile**: [`analyzers::analyze`] reads every column once and produces an
//!    immutable [`analyzers::MetricSnapshot`] (size, completeness, distinctness,
//!    numeric statistics and string lengths, chosen by column type).
//! 2. **Validate**: a [`core::Check`] groups constraints at a severity
//!    [`core::Level`]. Constraints read the snapshot where they can and scan rows
//!    only when they must.
//! 3. **Derive**: [`derivation::ExpectationDeriver`] turns a snapshot into a check
//!    the profiled data satisfies, widened by a tolerance, for validating later
//!    loads of the same table.
//!
//! [`pipeline::ValidationPipeline`] runs all three for many tables concurrently,
//! isolating failures per table and handing every outcome to a
//! [`reporter::ResultReporter`].
//!
//! ## Quick Start
//!
//! ```rust
//! use dq_guard::analyzers::analyze;
//! use dq_guard::core::{evaluate, Check, CheckStatus, Level};
//! use dq_guard::table::Table;
//! use arrow::array::{Int64Array, StringArray};
//! use arrow::datatypes::{DataType, Field, Schema};
//! use arrow::record_batch::RecordBatch;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Arc::new(Schema::new(vec![
//!     Field::new("emp_no", DataType::Int64, false),
//!     Field::new("gender", DataType::Utf8, true),
//! ]));
//! let batch = RecordBatch::try_new(
//!     schema,
//!     vec![
//!         Arc::new(Int64Array::from(vec![10001, 10002, 10003])),
//!         Arc::new(StringArray::from(vec!["M", "F", "M"])),
//!     ],
//! )?;
//! let table = Table::from_batch("employees", batch)?;
//!
//! let check = Check::builder("employees_quality")
//!     .level(Level::Error)
//!     .is_complete("emp_no")
//!     .is_unique("emp_no")
//!     .is_contained_in("gender", ["M", "F"])
//!     .build();
//!
//! let snapshot = analyze(&table);
//! let result = evaluate(&table, &snapshot, &check).await;
//! assert_eq!(result.status, CheckStatus::Success);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Checks are usually configured per table in JSON; see [`config`]. Tables without
//! a configured check get [`core::Check::default_for`], which only requires the
//! table to be non-empty.
//!
//! ## Logging
//!
//! All components emit `tracing` events with structured fields. Applications that
//! do not install their own subscriber can use [`logging::setup::init_logging`].

pub mod analyzers;
pub mod config;
pub mod constraints;
pub mod core;
pub mod derivation;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod prelude;
pub mod reporter;
pub mod sources;
pub mod table;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
