//! Expectation derivation: turning a profiled table into a check.
//!
//! The deriver reads a [`MetricSnapshot`] and emits [`ConstraintSpec`]s that the
//! profiled data satisfies. The resulting [`Check`] is evaluated like any
//! configured one, so a table re-validated against its own derived check passes.
//!
//! Each rule implements [`DerivationRule`]. A rule whose input metric is absent is
//! skipped with a [`DerivationSkipped`] record; the remaining rules still run.
//!
//! ```rust
//! use dq_guard::analyzers::{Analyzer, MetricScope, MetricSnapshot, MetricValue};
//! use dq_guard::derivation::{DerivationPolicy, ExpectationDeriver};
//! use dq_guard::table::{Column, ColumnType};
//!
//! let snapshot = MetricSnapshot::builder("salaries")
//!     .columns(vec![Column::new("salary", ColumnType::Numeric, false)])
//!     .metric(Analyzer::Size, MetricScope::Table, MetricValue::Count(4))
//!     .metric(Analyzer::Completeness, MetricScope::column("salary"), MetricValue::Ratio(1.0))
//!     .metric(Analyzer::Minimum, MetricScope::column("salary"), MetricValue::Numeric(30000.0))
//!     .metric(Analyzer::Maximum, MetricScope::column("salary"), MetricValue::Numeric(95000.0))
//!     .build();
//!
//! let policy = DerivationPolicy::with_tolerance(0.1);
//! let derivation = ExpectationDeriver::new(policy).unwrap().derive(&snapshot).unwrap();
//! assert_eq!(derivation.check.name(), "salaries_derived");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::analyzers::{Analyzer, MetricScope, MetricSnapshot};
use crate::constraints::{Assertion, ConstraintSpec};
use crate::core::{Check, Level};
use crate::prelude::*;

/// Matches column names conventionally used as keys: `id`, `*_id`, `*_no`.
pub const DEFAULT_KEY_PATTERN: &str = r"(?i)(^id$|_id$|_no$)";

fn default_key_pattern() -> String {
    DEFAULT_KEY_PATTERN.to_string()
}

fn default_true() -> bool {
    true
}

/// Parameters for deriving expectations from a profile.
///
/// There is no default tolerance: a zero tolerance makes every derived range equal
/// to the profiled one, so the value must always be chosen explicitly.
///
/// ```rust
/// use dq_guard::core::Level;
/// use dq_guard::derivation::DerivationPolicy;
///
/// let policy = DerivationPolicy::with_tolerance(0.05)
///     .key_pattern("^emp_no$")
///     .level(Level::Error)
///     .completeness_floor(0.9);
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationPolicy {
    /// Relative widening applied to derived ranges
    pub tolerance: f64,
    /// Regex selecting the columns eligible for a uniqueness expectation
    #[serde(default = "default_key_pattern")]
    pub key_pattern: String,
    /// Level of the derived check
    #[serde(default)]
    pub level: Level,
    /// Lowest observed completeness that still yields a thresholded expectation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completeness_floor: Option<f64>,
    #[serde(default = "default_true")]
    pub derive_size: bool,
    #[serde(default = "default_true")]
    pub derive_schema: bool,
}

impl DerivationPolicy {
    /// Creates a policy with the given tolerance and defaults for everything else.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            key_pattern: default_key_pattern(),
            level: Level::default(),
            completeness_floor: None,
            derive_size: true,
            derive_schema: true,
        }
    }

    pub fn key_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.key_pattern = pattern.into();
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn completeness_floor(mut self, floor: f64) -> Self {
        self.completeness_floor = Some(floor);
        self
    }

    pub fn derive_size(mut self, enabled: bool) -> Self {
        self.derive_size = enabled;
        self
    }

    pub fn derive_schema(mut self, enabled: bool) -> Self {
        self.derive_schema = enabled;
        self
    }

    /// Checks the tolerance, completeness floor and key pattern.
    pub fn validate(&self) -> Result<()> {
        self.compile_key_pattern().map(|_| ())
    }

    fn compile_key_pattern(&self) -> Result<Regex> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(GuardError::Configuration(format!(
                "derivation tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if let Some(floor) = self.completeness_floor {
            if !(0.0..=1.0).contains(&floor) {
                return Err(GuardError::Configuration(format!(
                    "completeness floor must be within [0, 1], got {floor}"
                )));
            }
        }
        Regex::new(&self.key_pattern).map_err(|e| {
            GuardError::Configuration(format!("invalid key pattern '{}': {e}", self.key_pattern))
        })
    }
}

/// A rule that could not run because the snapshot lacks a metric it reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationSkipped {
    pub rule: String,
    /// Column the rule was applied to; `None` for table-level rules
    pub column: Option<String>,
    /// The missing metric, as `analyzer(scope)`
    pub missing: String,
}

impl DerivationSkipped {
    fn new(rule: &str, scope: &MetricScope, analyzer: Analyzer) -> Self {
        Self {
            rule: rule.to_string(),
            column: scope.column_name().map(str::to_string),
            missing: format!("{analyzer}({scope})"),
        }
    }
}

impl fmt::Display for DerivationSkipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(
                f,
                "rule '{}' skipped for column '{column}': missing {}",
                self.rule, self.missing
            ),
            None => write!(f, "rule '{}' skipped: missing {}", self.rule, self.missing),
        }
    }
}

type RuleOutcome = std::result::Result<Option<ConstraintSpec>, DerivationSkipped>;

/// Where a rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget<'a> {
    Table,
    Column(&'a Column),
}

/// A single derivation rule.
pub trait DerivationRule: Send + Sync {
    /// Rule name recorded in [`DerivationSkipped`]
    fn name(&self) -> &'static str;

    /// Whether the rule runs for the given target.
    fn applies_to(&self, target: RuleTarget<'_>) -> bool;

    /// Derives at most one constraint from the snapshot.
    fn apply(&self, target: RuleTarget<'_>, snapshot: &MetricSnapshot) -> RuleOutcome;
}

fn lookup(
    snapshot: &MetricSnapshot,
    rule: &str,
    analyzer: Analyzer,
    scope: &MetricScope,
) -> std::result::Result<f64, DerivationSkipped> {
    snapshot
        .value(analyzer, scope)
        .ok_or_else(|| DerivationSkipped::new(rule, scope, analyzer))
}

fn column_scope(target: RuleTarget<'_>) -> Option<(&str, MetricScope)> {
    match target {
        RuleTarget::Column(column) => Some((&column.name, MetricScope::column(&column.name))),
        RuleTarget::Table => None,
    }
}

/// Fully complete columns must stay complete; nearly complete ones keep a
/// threshold below their observed completeness.
pub struct CompletenessRule {
    floor: Option<f64>,
    tolerance: f64,
}

impl DerivationRule for CompletenessRule {
    fn name(&self) -> &'static str {
        "completeness"
    }

    fn applies_to(&self, target: RuleTarget<'_>) -> bool {
        matches!(target, RuleTarget::Column(_))
    }

    fn apply(&self, target: RuleTarget<'_>, snapshot: &MetricSnapshot) -> RuleOutcome {
        let Some((column, scope)) = column_scope(target) else {
            return Ok(None);
        };
        let completeness = lookup(snapshot, self.name(), Analyzer::Completeness, &scope)?;
        if completeness == 1.0 {
            return Ok(Some(ConstraintSpec::IsComplete {
                column: column.to_string(),
                threshold: None,
            }));
        }
        match self.floor {
            Some(floor) if completeness >= floor => Ok(Some(ConstraintSpec::IsComplete {
                column: column.to_string(),
                threshold: Some((completeness * (1.0 - self.tolerance)).max(0.0)),
            })),
            _ => Ok(None),
        }
    }
}

/// Key-named columns whose every value is distinct must stay unique.
pub struct UniquenessRule {
    key_pattern: Regex,
}

impl DerivationRule for UniquenessRule {
    fn name(&self) -> &'static str {
        "uniqueness"
    }

    fn applies_to(&self, target: RuleTarget<'_>) -> bool {
        matches!(target, RuleTarget::Column(column) if self.key_pattern.is_match(&column.name))
    }

    fn apply(&self, target: RuleTarget<'_>, snapshot: &MetricSnapshot) -> RuleOutcome {
        let Some((column, scope)) = column_scope(target) else {
            return Ok(None);
        };
        let distinctness = lookup(snapshot, self.name(), Analyzer::Distinctness, &scope)?;
        Ok((distinctness == 1.0).then(|| ConstraintSpec::IsUnique {
            column: column.to_string(),
        }))
    }
}

/// Numeric columns keep to their profiled range, widened by the tolerance
/// relative to each bound's magnitude.
pub struct NumericRangeRule {
    tolerance: f64,
}

impl DerivationRule for NumericRangeRule {
    fn name(&self) -> &'static str {
        "numeric_range"
    }

    fn applies_to(&self, target: RuleTarget<'_>) -> bool {
        matches!(target, RuleTarget::Column(column) if column.column_type == ColumnType::Numeric)
    }

    fn apply(&self, target: RuleTarget<'_>, snapshot: &MetricSnapshot) -> RuleOutcome {
        let Some((column, scope)) = column_scope(target) else {
            return Ok(None);
        };
        let min = lookup(snapshot, self.name(), Analyzer::Minimum, &scope)?;
        let max = lookup(snapshot, self.name(), Analyzer::Maximum, &scope)?;
        Ok(Some(ConstraintSpec::NumericRange {
            column: column.to_string(),
            min: widen(min, -self.tolerance),
            max: widen(max, self.tolerance),
            per_row: false,
        }))
    }
}

/// Moves `bound` away from zero by `|bound| * tolerance`; a negative tolerance
/// lowers the bound. Zero tolerance and non-finite bounds are left unchanged.
fn widen(bound: f64, tolerance: f64) -> f64 {
    if tolerance == 0.0 || !bound.is_finite() {
        return bound;
    }
    bound + bound.abs() * tolerance
}

/// String columns keep to their profiled length range.
pub struct LengthRangeRule {
    tolerance: f64,
}

impl DerivationRule for LengthRangeRule {
    fn name(&self) -> &'static str {
        "length_range"
    }

    fn applies_to(&self, target: RuleTarget<'_>) -> bool {
        matches!(target, RuleTarget::Column(column) if column.column_type == ColumnType::String)
    }

    fn apply(&self, target: RuleTarget<'_>, snapshot: &MetricSnapshot) -> RuleOutcome {
        let Some((column, scope)) = column_scope(target) else {
            return Ok(None);
        };
        let shortest = lookup(snapshot, self.name(), Analyzer::MinLength, &scope)?;
        let longest = lookup(snapshot, self.name(), Analyzer::MaxLength, &scope)?;
        Ok(Some(ConstraintSpec::LengthRange {
            column: column.to_string(),
            min: (shortest * (1.0 - self.tolerance)).floor().max(0.0) as u64,
            max: (longest * (1.0 + self.tolerance)).ceil() as u64,
        }))
    }
}

/// The row count stays within the tolerance of the profiled count.
pub struct SizeRule {
    tolerance: f64,
}

impl DerivationRule for SizeRule {
    fn name(&self) -> &'static str {
        "size"
    }

    fn applies_to(&self, target: RuleTarget<'_>) -> bool {
        matches!(target, RuleTarget::Table)
    }

    fn apply(&self, _target: RuleTarget<'_>, snapshot: &MetricSnapshot) -> RuleOutcome {
        let size = lookup(snapshot, self.name(), Analyzer::Size, &MetricScope::Table)?;
        let lower = (size * (1.0 - self.tolerance)).floor().max(0.0);
        let upper = (size * (1.0 + self.tolerance)).ceil();
        Ok(Some(ConstraintSpec::Size {
            assertion: Assertion::Between(lower, upper),
        }))
    }
}

/// The table keeps its profiled columns in their profiled order.
pub struct SchemaRule;

impl DerivationRule for SchemaRule {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn applies_to(&self, target: RuleTarget<'_>) -> bool {
        matches!(target, RuleTarget::Table)
    }

    fn apply(&self, _target: RuleTarget<'_>, snapshot: &MetricSnapshot) -> RuleOutcome {
        Ok(Some(ConstraintSpec::ColumnsMatch {
            columns: snapshot.columns().iter().map(|c| c.name.clone()).collect(),
        }))
    }
}

/// The outcome of one derivation.
#[derive(Debug, Clone)]
pub struct Derivation {
    /// The derived check, named `<table>_derived`
    pub check: Check,
    /// The constraints of `check` in declarative form, in the same order
    pub specs: Vec<ConstraintSpec>,
    pub skipped: Vec<DerivationSkipped>,
}

/// Applies the rules selected by a [`DerivationPolicy`] to metric snapshots.
pub struct ExpectationDeriver {
    level: Level,
    rules: Vec<Box<dyn DerivationRule>>,
}

impl ExpectationDeriver {
    /// Builds the rule set for `policy`, failing if the policy is invalid.
    pub fn new(policy: DerivationPolicy) -> Result<Self> {
        let key_pattern = policy.compile_key_pattern()?;
        let tolerance = policy.tolerance;
        if tolerance == 0.0 {
            warn!("Derivation tolerance is zero; derived ranges will equal the profiled ones");
        }

        let mut rules: Vec<Box<dyn DerivationRule>> = Vec::new();
        if policy.derive_size {
            rules.push(Box::new(SizeRule { tolerance }));
        }
        if policy.derive_schema {
            rules.push(Box::new(SchemaRule));
        }
        rules.push(Box::new(CompletenessRule {
            floor: policy.completeness_floor,
            tolerance,
        }));
        rules.push(Box::new(UniquenessRule { key_pattern }));
        rules.push(Box::new(NumericRangeRule { tolerance }));
        rules.push(Box::new(LengthRangeRule { tolerance }));

        Ok(Self {
            level: policy.level,
            rules,
        })
    }

    /// Adds a custom rule after the built-in ones.
    pub fn add_rule(mut self, rule: Box<dyn DerivationRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Derives a check from `snapshot`.
    ///
    /// Table-level rules run first, then every rule for each column in column order.
    #[instrument(skip(self, snapshot), fields(table.name = %snapshot.table_name(), rules = self.rules.len()))]
    pub fn derive(&self, snapshot: &MetricSnapshot) -> Result<Derivation> {
        let mut specs = Vec::new();
        let mut skipped = Vec::new();

        let targets = std::iter::once(RuleTarget::Table)
            .chain(snapshot.columns().iter().map(RuleTarget::Column));
        for target in targets {
            for rule in self.rules.iter().filter(|r| r.applies_to(target)) {
                match rule.apply(target, snapshot) {
                    Ok(Some(spec)) => {
                        debug!(rule = rule.name(), constraint = ?spec, "Derived constraint");
                        specs.push(spec);
                    }
                    Ok(None) => {}
                    Err(skip) => {
                        warn!(
                            table.name = %snapshot.table_name(),
                            rule = %skip.rule,
                            column = ?skip.column,
                            missing = %skip.missing,
                            "Derivation rule skipped"
                        );
                        skipped.push(skip);
                    }
                }
            }
        }

        let mut builder = Check::builder(format!("{}_derived", snapshot.table_name()))
            .level(self.level)
            .description(format!(
                "Expectations derived from the {} profile",
                snapshot.table_name()
            ));
        for spec in &specs {
            builder = builder.spec(spec)?;
        }

        info!(
            table.name = %snapshot.table_name(),
            derived = specs.len(),
            skipped = skipped.len(),
            "Derived expectations"
        );
        Ok(Derivation {
            check: builder.build(),
            specs,
            skipped,
        })
    }
}

/// Derives a check from `snapshot` under `policy`.
pub fn derive(snapshot: &MetricSnapshot, policy: &DerivationPolicy) -> Result<Derivation> {
    ExpectationDeriver::new(policy.clone())?.derive(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{analyze, MetricValue};
    use crate::core::evaluate;
    use crate::test_fixtures::{employees, empty_employees, salaries};

    fn specs_for(table: &Table, policy: DerivationPolicy) -> Derivation {
        derive(&analyze(table), &policy).unwrap()
    }

    #[test]
    fn test_policy_json_requires_tolerance() {
        assert!(serde_json::from_str::<DerivationPolicy>("{}").is_err());

        let policy: DerivationPolicy = serde_json::from_str(r#"{"tolerance": 0.1}"#).unwrap();
        assert_eq!(policy, DerivationPolicy::with_tolerance(0.1));
        assert!(policy.derive_size && policy.derive_schema);
        assert_eq!(policy.key_pattern, DEFAULT_KEY_PATTERN);
    }

    #[test]
    fn test_policy_validation() {
        assert!(DerivationPolicy::with_tolerance(-0.1).validate().is_err());
        assert!(DerivationPolicy::with_tolerance(f64::NAN).validate().is_err());
        assert!(DerivationPolicy::with_tolerance(0.1)
            .completeness_floor(1.5)
            .validate()
            .is_err());
        assert!(DerivationPolicy::with_tolerance(0.1)
            .key_pattern("(unclosed")
            .validate()
            .is_err());
        assert!(DerivationPolicy::with_tolerance(0.0).validate().is_ok());
    }

    #[test]
    fn test_salary_range_widened_by_magnitude() {
        let derivation = specs_for(&salaries(), DerivationPolicy::with_tolerance(0.1));
        let range = derivation
            .specs
            .iter()
            .find(|s| {
                matches!(s, ConstraintSpec::NumericRange { column, .. } if column == "salary")
            })
            .unwrap();
        let ConstraintSpec::NumericRange { min, max, .. } = range else {
            unreachable!()
        };
        assert!((min - 27000.0).abs() < 1e-6);
        assert!((max - 104500.0).abs() < 1e-6);
    }

    #[test]
    fn test_employee_rules() {
        let derivation = specs_for(&employees(), DerivationPolicy::with_tolerance(0.1));
        let specs = &derivation.specs;

        assert_eq!(
            specs[0],
            ConstraintSpec::Size {
                assertion: Assertion::Between(4.0, 6.0)
            }
        );
        assert!(matches!(
            &specs[1],
            ConstraintSpec::ColumnsMatch { columns } if columns.len() == 6
        ));
        assert!(specs.contains(&ConstraintSpec::IsUnique {
            column: "emp_no".to_string()
        }));
        assert!(specs.contains(&ConstraintSpec::LengthRange {
            column: "first_name".to_string(),
            min: 4,
            max: 10,
        }));
        // gender has a null and no floor is set
        assert!(!specs.iter().any(|s| matches!(
            s,
            ConstraintSpec::IsComplete { column, .. } if column == "gender"
        )));
        // first_name is distinct but not key-named
        assert!(!specs.contains(&ConstraintSpec::IsUnique {
            column: "first_name".to_string()
        }));
    }

    #[test]
    fn test_completeness_floor_emits_threshold() {
        let derivation = specs_for(
            &employees(),
            DerivationPolicy::with_tolerance(0.1).completeness_floor(0.5),
        );
        let gender = derivation
            .specs
            .iter()
            .find_map(|s| match s {
                ConstraintSpec::IsComplete {
                    column,
                    threshold: Some(t),
                } if column == "gender" => Some(*t),
                _ => None,
            })
            .unwrap();
        assert!((gender - 0.72).abs() < 1e-9);
    }

    #[test]
    fn test_missing_metrics_are_skipped() {
        let derivation = specs_for(&empty_employees(), DerivationPolicy::with_tolerance(0.1));
        assert!(derivation
            .skipped
            .iter()
            .any(|s| s.rule == "numeric_range" && s.column.as_deref() == Some("emp_no")));
        assert!(derivation
            .skipped
            .iter()
            .any(|s| s.rule == "length_range" && s.missing == "min_length(first_name)"));
        assert_eq!(
            derivation.check.constraints().len(),
            derivation.specs.len()
        );
    }

    #[test]
    fn test_missing_size_skips_only_size_rule() {
        let snapshot = MetricSnapshot::builder("t")
            .columns(vec![Column::new("id", ColumnType::Numeric, false)])
            .metric(Analyzer::Distinctness, MetricScope::column("id"), MetricValue::Ratio(1.0))
            .build();
        let derivation = derive(&snapshot, &DerivationPolicy::with_tolerance(0.1)).unwrap();
        assert_eq!(derivation.skipped[0].rule, "size");
        assert_eq!(derivation.skipped[0].column, None);
        assert!(derivation.specs.contains(&ConstraintSpec::IsUnique {
            column: "id".to_string()
        }));
    }

    #[tokio::test]
    async fn test_derived_check_passes_on_profiled_data() {
        for table in [employees(), salaries(), empty_employees()] {
            let snapshot = analyze(&table);
            let policy = DerivationPolicy::with_tolerance(0.0).completeness_floor(0.0);
            let derivation = derive(&snapshot, &policy).unwrap();
            let result = evaluate(&table, &snapshot, &derivation.check).await;
            assert_eq!(
                result.failed_count(),
                0,
                "{}: {:?}",
                table.name(),
                result.constraint_results
            );
        }
    }

    #[test]
    fn test_widen_keeps_zero_tolerance_and_infinite_bounds() {
        assert_eq!(widen(-200.0, -0.1), -220.0);
        assert_eq!(widen(200.0, 0.1), 220.0);
        assert_eq!(widen(f64::INFINITY, 0.0), f64::INFINITY);
        assert_eq!(widen(f64::NEG_INFINITY, -0.5), f64::NEG_INFINITY);

        let scope = MetricScope::column("reading");
        let snapshot = MetricSnapshot::builder("sensors")
            .columns(vec![Column::new("reading", ColumnType::Numeric, false)])
            .metric(Analyzer::Minimum, scope.clone(), MetricValue::Numeric(-5.0))
            .metric(Analyzer::Maximum, scope, MetricValue::Numeric(f64::INFINITY))
            .build();
        let derivation = derive(&snapshot, &DerivationPolicy::with_tolerance(0.0)).unwrap();
        let range = derivation.specs.iter().find_map(|spec| match spec {
            ConstraintSpec::NumericRange { min, max, .. } => Some((*min, *max)),
            _ => None,
        });
        assert_eq!(range, Some((-5.0, f64::INFINITY)));
    }

    #[test]
    fn test_zero_tolerance_from_json_warns() {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let policy: DerivationPolicy = serde_json::from_str(r#"{"tolerance": 0}"#).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            ExpectationDeriver::new(policy).unwrap();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Derivation tolerance is zero"), "{output}");
    }
}
