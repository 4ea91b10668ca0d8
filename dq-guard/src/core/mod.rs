//! Core validation types.
//!
//! - **[`Check`]**: a named group of constraints with a severity [`Level`]
//! - **[`Constraint`]**: one validation rule (implementations live in
//!   [`constraints`](crate::constraints))
//! - **[`EvaluationContext`]**: the table and metric snapshot a constraint reads
//! - **[`CheckResult`]** / **[`ValidationResult`]**: per-check and per-table outcomes
//!
//! ```text
//! ValidationSuite (one table)
//!     ├── Check (Level: Error)
//!     │   ├── Constraint 1 ─┐
//!     │   └── Constraint 2 ─┴─ evaluated concurrently
//!     └── Check (Level: Warning)
//!         └── Constraint 3
//! ```
//!
//! A check fails when any of its constraints fails; its status is then its level.
//! The validation status is the most severe check status.

mod check;
mod constraint;
mod context;
mod level;
mod result;
mod suite;

pub use check::{Check, CheckBuilder};
pub use constraint::{Constraint, ConstraintResult, ConstraintStatus, EvaluationMode};
pub use context::{quote_identifier, EvaluationContext};
pub use level::Level;
pub use result::{CheckResult, CheckStatus, ValidationResult};
pub use suite::{evaluate, ValidationSuite, ValidationSuiteBuilder};
