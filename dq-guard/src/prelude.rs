//! Prelude for commonly used types and traits in dq-guard.

pub use crate::error::{ErrorContext, GuardError, Result};
pub use crate::logging::LogConfig;
pub use crate::table::{Column, ColumnType, Table};
