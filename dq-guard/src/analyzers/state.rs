//! Per-column accumulators for the single-pass analyzer.
//!
//! Each column gets one [`ColumnAccumulator`], chosen once from its
//! [`ColumnType`]. The runner feeds every batch's array to the accumulator exactly
//! once; all metrics for the column are derived from the accumulated state.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, UInt64Type};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::collections::HashMap;

use super::errors::AnalyzerError;
use super::snapshot::SnapshotBuilder;
use super::types::{Analyzer, MetricScope, MetricValue};
use crate::table::ColumnType;

/// Hashable identity of a non-null value, used for distinct counting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Int(i64),
    UInt(u64),
    /// Bit pattern of the float, with `-0.0` folded into `0.0` and one canonical NaN
    Float(u64),
    Str(String),
    Bool(bool),
    /// Display form for types without a native key
    Other(String),
}

impl ValueKey {
    fn float(value: f64) -> Self {
        let canonical = if value.is_nan() {
            f64::NAN
        } else if value == 0.0 {
            0.0
        } else {
            value
        };
        ValueKey::Float(canonical.to_bits())
    }
}

/// State shared by every column type: null and frequency counts.
#[derive(Debug, Default)]
pub(crate) struct BaseState {
    non_null: u64,
    frequencies: HashMap<ValueKey, u64>,
    failure: Option<AnalyzerError>,
}

impl BaseState {
    fn count_non_null(&mut self, array: &dyn Array) {
        self.non_null += (array.len() - array.logical_null_count()) as u64;
    }

    fn add_key(&mut self, key: ValueKey) {
        *self.frequencies.entry(key).or_insert(0) += 1;
    }

    fn fail(&mut self, error: AnalyzerError) {
        if self.failure.is_none() {
            self.failure = Some(error);
            self.frequencies.clear();
        }
    }

    fn update_keys(&mut self, column: &str, array: &ArrayRef) {
        if self.failure.is_some() {
            return;
        }
        if let Err(e) = self.collect_keys(column, array) {
            self.fail(e);
        }
    }

    fn collect_keys(&mut self, column: &str, array: &ArrayRef) -> Result<(), AnalyzerError> {
        let data_type = array.data_type();
        if data_type.is_signed_integer() {
            let ints = cast(array, &DataType::Int64)?;
            for value in ints.as_primitive::<Int64Type>().iter().flatten() {
                self.add_key(ValueKey::Int(value));
            }
        } else if data_type.is_unsigned_integer() {
            let ints = cast(array, &DataType::UInt64)?;
            for value in ints.as_primitive::<UInt64Type>().iter().flatten() {
                self.add_key(ValueKey::UInt(value));
            }
        } else if data_type.is_floating() {
            let floats = cast(array, &DataType::Float64)?;
            for value in floats.as_primitive::<Float64Type>().iter().flatten() {
                self.add_key(ValueKey::float(value));
            }
        } else if let Some(bools) = array.as_boolean_opt() {
            for value in bools.iter().flatten() {
                self.add_key(ValueKey::Bool(value));
            }
        } else {
            let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())
                .map_err(|e| AnalyzerError::unreadable_column(column, e.to_string()))?;
            let nulls = array.logical_nulls();
            for idx in 0..array.len() {
                if nulls.as_ref().is_some_and(|n| n.is_null(idx)) {
                    continue;
                }
                self.add_key(ValueKey::Other(formatter.value(idx).to_string()));
            }
        }
        Ok(())
    }

    fn finish(self, column: &str, rows: u64, uniqueness: bool, builder: &mut SnapshotBuilder) {
        let scope = MetricScope::column(column);
        builder.insert(
            Analyzer::Completeness,
            scope.clone(),
            MetricValue::Ratio(ratio(self.non_null, rows)),
        );

        let mut dependents = vec![Analyzer::Distinctness, Analyzer::CountDistinct];
        if uniqueness {
            dependents.push(Analyzer::Uniqueness);
        }
        if let Some(error) = &self.failure {
            for analyzer in dependents {
                builder.record_error(analyzer, column, error);
            }
            return;
        }

        let distinct = self.frequencies.len() as u64;
        builder.insert(
            Analyzer::Distinctness,
            scope.clone(),
            MetricValue::Ratio(ratio(distinct, rows)),
        );
        builder.insert(
            Analyzer::CountDistinct,
            scope.clone(),
            MetricValue::Count(distinct),
        );
        if uniqueness {
            let singletons = self.frequencies.values().filter(|&&n| n == 1).count() as u64;
            builder.insert(
                Analyzer::Uniqueness,
                scope,
                MetricValue::Ratio(ratio(singletons, rows)),
            );
        }
    }
}

/// Running moments and extrema of a numeric column (Welford's algorithm).
#[derive(Debug)]
pub(crate) struct NumericState {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
    failure: Option<AnalyzerError>,
}

impl Default for NumericState {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            failure: None,
        }
    }
}

impl NumericState {
    fn update(&mut self, array: &ArrayRef) {
        if self.failure.is_some() {
            return;
        }
        let floats = match cast(array, &DataType::Float64) {
            Ok(floats) => floats,
            Err(e) => {
                self.failure = Some(e.into());
                return;
            }
        };
        for value in floats.as_primitive::<Float64Type>().iter().flatten() {
            if !value.is_finite() {
                continue;
            }
            self.count += 1;
            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
    }

    fn std_dev(&self) -> f64 {
        if self.count <= 1 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }

    fn finish(self, column: &str, builder: &mut SnapshotBuilder) {
        if let Some(error) = &self.failure {
            for analyzer in [
                Analyzer::Minimum,
                Analyzer::Maximum,
                Analyzer::Mean,
                Analyzer::StandardDeviation,
            ] {
                builder.record_error(analyzer, column, error);
            }
            return;
        }

        let scope = MetricScope::column(column);
        if self.count > 0 {
            builder.insert(Analyzer::Minimum, scope.clone(), MetricValue::Numeric(self.min));
            builder.insert(Analyzer::Maximum, scope.clone(), MetricValue::Numeric(self.max));
            Self::insert_finite(builder, Analyzer::Mean, column, self.mean);
        }
        Self::insert_finite(builder, Analyzer::StandardDeviation, column, self.std_dev());
    }

    // Reports stay representable in JSON, which has no infinities.
    fn insert_finite(builder: &mut SnapshotBuilder, analyzer: Analyzer, column: &str, value: f64) {
        if value.is_finite() {
            builder.insert(analyzer, MetricScope::column(column), MetricValue::Numeric(value));
        } else {
            let error =
                AnalyzerError::metric_computation(format!("{analyzer} overflowed to {value}"));
            builder.record_error(analyzer, column, &error);
        }
    }
}

/// Shortest and longest string seen, in characters.
#[derive(Debug, Default)]
pub(crate) struct LengthState {
    min: Option<u64>,
    max: Option<u64>,
    failure: Option<AnalyzerError>,
}

impl LengthState {
    fn observe(&mut self, length: u64) {
        self.min = Some(self.min.map_or(length, |m| m.min(length)));
        self.max = Some(self.max.map_or(length, |m| m.max(length)));
    }

    fn finish(self, column: &str, builder: &mut SnapshotBuilder) {
        if let Some(error) = &self.failure {
            builder.record_error(Analyzer::MinLength, column, error);
            builder.record_error(Analyzer::MaxLength, column, error);
            return;
        }
        let scope = MetricScope::column(column);
        if let Some(min) = self.min {
            builder.insert(Analyzer::MinLength, scope.clone(), MetricValue::Length(min));
        }
        if let Some(max) = self.max {
            builder.insert(Analyzer::MaxLength, scope, MetricValue::Length(max));
        }
    }
}

/// The analyzers selected for one column, resolved once from its type.
#[derive(Debug)]
pub(crate) enum ColumnAccumulator {
    Numeric {
        base: BaseState,
        stats: NumericState,
    },
    Text {
        base: BaseState,
        lengths: LengthState,
    },
    Base {
        base: BaseState,
    },
}

impl ColumnAccumulator {
    pub(crate) fn for_type(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Numeric => ColumnAccumulator::Numeric {
                base: BaseState::default(),
                stats: NumericState::default(),
            },
            ColumnType::String => ColumnAccumulator::Text {
                base: BaseState::default(),
                lengths: LengthState::default(),
            },
            ColumnType::Boolean | ColumnType::Other => ColumnAccumulator::Base {
                base: BaseState::default(),
            },
        }
    }

    /// Folds one batch's array for this column into the state.
    pub(crate) fn update(&mut self, column: &str, array: &ArrayRef) {
        match self {
            ColumnAccumulator::Numeric { base, stats } => {
                base.count_non_null(array.as_ref());
                base.update_keys(column, array);
                stats.update(array);
            }
            ColumnAccumulator::Text { base, lengths } => {
                base.count_non_null(array.as_ref());
                if base.failure.is_some() && lengths.failure.is_some() {
                    return;
                }
                let strings = match cast(array, &DataType::Utf8) {
                    Ok(strings) => strings,
                    Err(e) => {
                        base.fail(AnalyzerError::unreadable_column(column, e.to_string()));
                        lengths.failure = Some(AnalyzerError::unreadable_column(
                            column,
                            e.to_string(),
                        ));
                        return;
                    }
                };
                for value in strings.as_string::<i32>().iter().flatten() {
                    lengths.observe(value.chars().count() as u64);
                    if base.failure.is_none() {
                        base.add_key(ValueKey::Str(value.to_string()));
                    }
                }
            }
            ColumnAccumulator::Base { base } => {
                base.count_non_null(array.as_ref());
                base.update_keys(column, array);
            }
        }
    }

    /// Number of non-null cells seen so far.
    pub(crate) fn non_null(&self) -> u64 {
        match self {
            ColumnAccumulator::Numeric { base, .. }
            | ColumnAccumulator::Text { base, .. }
            | ColumnAccumulator::Base { base } => base.non_null,
        }
    }

    /// Emits this column's metrics and any recorded failures.
    pub(crate) fn finish(self, column: &str, rows: u64, builder: &mut SnapshotBuilder) {
        match self {
            ColumnAccumulator::Numeric { base, stats } => {
                base.finish(column, rows, false, builder);
                stats.finish(column, builder);
            }
            ColumnAccumulator::Text { base, lengths } => {
                base.finish(column, rows, true, builder);
                lengths.finish(column, builder);
            }
            ColumnAccumulator::Base { base } => base.finish(column, rows, false, builder),
        }
    }
}

/// `part / whole`, or 0 for an empty whole.
pub(crate) fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::MetricSnapshot;
    use arrow::array::{Float64Array, Int32Array, StringArray};
    use std::sync::Arc;

    fn finish(acc: ColumnAccumulator, rows: u64) -> MetricSnapshot {
        let mut builder = MetricSnapshot::builder("t");
        acc.finish("c", rows, &mut builder);
        builder.build()
    }

    #[test]
    fn test_welford_matches_population_std_dev() {
        let mut acc = ColumnAccumulator::for_type(ColumnType::Numeric);
        let first: ArrayRef = Arc::new(Float64Array::from(vec![2.0, 4.0, 4.0, 4.0]));
        let second: ArrayRef = Arc::new(Float64Array::from(vec![
            Some(5.0),
            None,
            Some(5.0),
            Some(7.0),
            Some(9.0),
        ]));
        acc.update("c", &first);
        acc.update("c", &second);

        let snapshot = finish(acc, 9);
        let scope = MetricScope::column("c");
        assert!((snapshot.value(Analyzer::Mean, &scope).unwrap() - 5.0).abs() < 1e-9);
        assert!((snapshot.value(Analyzer::StandardDeviation, &scope).unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(snapshot.value(Analyzer::Minimum, &scope), Some(2.0));
        assert_eq!(snapshot.value(Analyzer::Maximum, &scope), Some(9.0));
        let completeness = snapshot.value(Analyzer::Completeness, &scope).unwrap();
        assert!((completeness - 8.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_nan_excluded_from_statistics() {
        let mut acc = ColumnAccumulator::for_type(ColumnType::Numeric);
        let array: ArrayRef = Arc::new(Float64Array::from(vec![1.0, f64::NAN, 3.0]));
        acc.update("c", &array);

        let snapshot = finish(acc, 3);
        let scope = MetricScope::column("c");
        assert_eq!(snapshot.value(Analyzer::Mean, &scope), Some(2.0));
        assert_eq!(snapshot.value(Analyzer::CountDistinct, &scope), Some(3.0));
    }

    #[test]
    fn test_infinities_excluded_from_statistics() {
        let mut acc = ColumnAccumulator::for_type(ColumnType::Numeric);
        let array: ArrayRef = Arc::new(Float64Array::from(vec![
            Some(f64::INFINITY),
            Some(2.0),
            Some(f64::NEG_INFINITY),
            Some(4.0),
        ]));
        acc.update("c", &array);

        let snapshot = finish(acc, 4);
        let scope = MetricScope::column("c");
        assert_eq!(snapshot.value(Analyzer::Minimum, &scope), Some(2.0));
        assert_eq!(snapshot.value(Analyzer::Maximum, &scope), Some(4.0));
        assert_eq!(snapshot.value(Analyzer::Mean, &scope), Some(3.0));
        assert_eq!(snapshot.value(Analyzer::CountDistinct, &scope), Some(4.0));
    }

    #[test]
    fn test_overflowing_mean_is_recorded_as_error() {
        let mut acc = ColumnAccumulator::for_type(ColumnType::Numeric);
        let array: ArrayRef = Arc::new(Float64Array::from(vec![f64::MAX, -f64::MAX]));
        acc.update("c", &array);

        let snapshot = finish(acc, 2);
        let scope = MetricScope::column("c");
        assert_eq!(snapshot.value(Analyzer::Maximum, &scope), Some(f64::MAX));
        assert_eq!(snapshot.value(Analyzer::StandardDeviation, &scope), None);
        assert!(snapshot
            .errors()
            .iter()
            .any(|e| e.analyzer == Analyzer::StandardDeviation));
    }

    #[test]
    fn test_single_value_std_dev_is_zero() {
        let mut acc = ColumnAccumulator::for_type(ColumnType::Numeric);
        let array: ArrayRef = Arc::new(Int32Array::from(vec![42]));
        acc.update("c", &array);

        let snapshot = finish(acc, 1);
        assert_eq!(
            snapshot.value(Analyzer::StandardDeviation, &MetricScope::column("c")),
            Some(0.0)
        );
    }

    #[test]
    fn test_all_null_numeric_emits_no_extrema() {
        let mut acc = ColumnAccumulator::for_type(ColumnType::Numeric);
        let array: ArrayRef = Arc::new(Int32Array::from(vec![None, None]));
        acc.update("c", &array);

        let snapshot = finish(acc, 2);
        let scope = MetricScope::column("c");
        assert!(snapshot.metric(Analyzer::Minimum, &scope).is_none());
        assert!(snapshot.metric(Analyzer::Mean, &scope).is_none());
        assert_eq!(snapshot.value(Analyzer::StandardDeviation, &scope), Some(0.0));
        assert_eq!(snapshot.value(Analyzer::Completeness, &scope), Some(0.0));
    }

    #[test]
    fn test_text_lengths_count_characters() {
        let mut acc = ColumnAccumulator::for_type(ColumnType::String);
        let array: ArrayRef = Arc::new(StringArray::from(vec![
            Some("Zoë"),
            Some("Bob"),
            None,
            Some("Bob"),
            Some("Alexandra"),
        ]));
        acc.update("c", &array);

        let snapshot = finish(acc, 5);
        let scope = MetricScope::column("c");
        assert_eq!(snapshot.value(Analyzer::MinLength, &scope), Some(3.0));
        assert_eq!(snapshot.value(Analyzer::MaxLength, &scope), Some(9.0));
        assert_eq!(snapshot.value(Analyzer::CountDistinct, &scope), Some(3.0));
        // "Zoë" and "Alexandra" occur once
        assert_eq!(snapshot.value(Analyzer::Uniqueness, &scope), Some(0.4));
    }

    #[test]
    fn test_signed_zero_is_one_value() {
        let mut acc = ColumnAccumulator::for_type(ColumnType::Numeric);
        let array: ArrayRef = Arc::new(Float64Array::from(vec![0.0, -0.0]));
        acc.update("c", &array);

        let snapshot = finish(acc, 2);
        assert_eq!(
            snapshot.value(Analyzer::CountDistinct, &MetricScope::column("c")),
            Some(1.0)
        );
    }

    #[test]
    fn test_ratio_of_empty_whole() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }
}
