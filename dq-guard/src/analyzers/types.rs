//! Metric identifiers and values produced by the analyzer engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The analyzers the engine knows how to compute.
///
/// Ordering follows declaration order, which keeps snapshot iteration stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    /// Number of rows in the table
    Size,
    /// Fraction of non-null cells (per column or across the table)
    Completeness,
    /// Distinct non-null values divided by the row count
    Distinctness,
    /// Number of distinct non-null values
    CountDistinct,
    /// Values occurring exactly once divided by the row count
    Uniqueness,
    Minimum,
    Maximum,
    Mean,
    /// Population standard deviation
    StandardDeviation,
    /// Shortest string length in characters
    MinLength,
    /// Longest string length in characters
    MaxLength,
}

impl Analyzer {
    /// Returns the snake_case name used in reports and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Analyzer::Size => "size",
            Analyzer::Completeness => "completeness",
            Analyzer::Distinctness => "distinctness",
            Analyzer::CountDistinct => "count_distinct",
            Analyzer::Uniqueness => "uniqueness",
            Analyzer::Minimum => "minimum",
            Analyzer::Maximum => "maximum",
            Analyzer::Mean => "mean",
            Analyzer::StandardDeviation => "standard_deviation",
            Analyzer::MinLength => "min_length",
            Analyzer::MaxLength => "max_length",
        }
    }
}

impl fmt::Display for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a metric describes: the whole table or a single column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "column", rename_all = "snake_case")]
pub enum MetricScope {
    Table,
    Column(String),
}

impl MetricScope {
    /// Shorthand for a column scope.
    pub fn column(name: impl Into<String>) -> Self {
        MetricScope::Column(name.into())
    }

    /// Returns the column name for column scopes.
    pub fn column_name(&self) -> Option<&str> {
        match self {
            MetricScope::Table => None,
            MetricScope::Column(name) => Some(name),
        }
    }
}

impl fmt::Display for MetricScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricScope::Table => write!(f, "table"),
            MetricScope::Column(name) => write!(f, "{name}"),
        }
    }
}

/// The kind of a metric value, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Count,
    Ratio,
    Numeric,
    Length,
}

/// A computed metric value. The variant is the metric kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    /// Row or value counts
    Count(u64),
    /// Fractions in `[0, 1]`
    Ratio(f64),
    /// Statistics in the column's own unit
    Numeric(f64),
    /// String lengths in characters
    Length(u64),
}

impl MetricValue {
    /// Returns the kind tag of this value.
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Count(_) => MetricKind::Count,
            MetricValue::Ratio(_) => MetricKind::Ratio,
            MetricValue::Numeric(_) => MetricKind::Numeric,
            MetricValue::Length(_) => MetricKind::Length,
        }
    }

    /// Returns the value as a float, the unit every constraint compares in.
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Count(v) | MetricValue::Length(v) => *v as f64,
            MetricValue::Ratio(v) | MetricValue::Numeric(v) => *v,
        }
    }

    /// Rebuilds a value from its kind and a float payload.
    ///
    /// Counts and lengths are rounded; a negative or non-finite count is rejected.
    pub fn from_parts(kind: MetricKind, value: f64) -> Option<Self> {
        match kind {
            MetricKind::Ratio => Some(MetricValue::Ratio(value)),
            MetricKind::Numeric => Some(MetricValue::Numeric(value)),
            MetricKind::Count | MetricKind::Length => {
                if !value.is_finite() || value < 0.0 {
                    return None;
                }
                let rounded = value.round() as u64;
                Some(if kind == MetricKind::Count {
                    MetricValue::Count(rounded)
                } else {
                    MetricValue::Length(rounded)
                })
            }
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(v) | MetricValue::Length(v) => write!(f, "{v}"),
            MetricValue::Ratio(v) => write!(f, "{v:.4}"),
            MetricValue::Numeric(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{v:.0}")
                } else {
                    write!(f, "{v:.4}")
                }
            }
        }
    }
}

/// One computed metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub analyzer: Analyzer,
    pub scope: MetricScope,
    pub value: MetricValue,
}

impl Metric {
    pub fn new(analyzer: Analyzer, scope: MetricScope, value: MetricValue) -> Self {
        Self {
            analyzer,
            scope,
            value,
        }
    }

    /// Returns the metric kind.
    pub fn kind(&self) -> MetricKind {
        self.value.kind()
    }
}
