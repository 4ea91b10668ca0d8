//! Integration tests for deriving expectations from profiles.

mod common;

use common::{departments, employees, salaries};
use dq_guard::analyzers::{analyze, MetricSnapshot};
use dq_guard::constraints::ConstraintSpec;
use dq_guard::core::{evaluate, CheckStatus, Level};
use dq_guard::derivation::{derive, DerivationPolicy, ExpectationDeriver};
use dq_guard::reporter::MetricsReport;

fn salary_range(specs: &[ConstraintSpec]) -> (f64, f64) {
    specs
        .iter()
        .find_map(|s| match s {
            ConstraintSpec::NumericRange { column, min, max, .. } if column == "salary" => {
                Some((*min, *max))
            }
            _ => None,
        })
        .unwrap()
}

#[tokio::test]
async fn test_salary_range_widened_and_self_consistent() {
    let table = salaries();
    let snapshot = analyze(&table);
    let derivation = derive(&snapshot, &DerivationPolicy::with_tolerance(0.1)).unwrap();

    let (min, max) = salary_range(&derivation.specs);
    assert!(min < 30000.0 && (min - 27000.0).abs() < 1e-6);
    assert!(max > 95000.0 && (max - 104500.0).abs() < 1e-6);

    let result = evaluate(&table, &snapshot, &derivation.check).await;
    assert_eq!(result.status, CheckStatus::Success, "{:?}", result.constraint_results);
}

#[tokio::test]
async fn test_derived_checks_pass_on_their_own_data() {
    for tolerance in [0.0, 0.05, 0.5] {
        for table in [employees(), salaries(), departments()] {
            let snapshot = analyze(&table);
            let policy = DerivationPolicy::with_tolerance(tolerance).completeness_floor(0.5);
            let derivation = derive(&snapshot, &policy).unwrap();
            assert!(derivation.skipped.is_empty());

            let result = evaluate(&table, &snapshot, &derivation.check).await;
            assert_eq!(
                result.failed_count(),
                0,
                "{} at tolerance {tolerance}: {:?}",
                table.name(),
                result.constraint_results
            );
        }
    }
}

#[tokio::test]
async fn test_derived_check_catches_drift() {
    let baseline = analyze(&salaries());
    let deriver = ExpectationDeriver::new(
        DerivationPolicy::with_tolerance(0.1).level(Level::Error),
    )
    .unwrap();
    let derivation = deriver.derive(&baseline).unwrap();

    // a later load with fewer rows and a different schema
    let drifted = common::table_with_rows("salaries", 2);
    let drifted_snapshot = analyze(&drifted);
    let result = evaluate(&drifted, &drifted_snapshot, &derivation.check).await;
    assert_eq!(result.status, CheckStatus::Error);
    assert!(result
        .constraint_results
        .iter()
        .any(|r| r.description.starts_with("size between")));
}

#[tokio::test]
async fn test_derivation_from_reported_profile() {
    let table = employees();
    let report = MetricsReport::from_snapshot(&analyze(&table));
    let json = serde_json::to_string_pretty(&report).unwrap();

    let restored = MetricSnapshot::from_report(&serde_json::from_str(&json).unwrap()).unwrap();
    let derivation = derive(&restored, &DerivationPolicy::with_tolerance(0.1)).unwrap();

    assert!(derivation.specs.contains(&ConstraintSpec::IsUnique {
        column: "emp_no".to_string()
    }));
    let snapshot = analyze(&table);
    let result = evaluate(&table, &snapshot, &derivation.check).await;
    assert_eq!(result.failed_count(), 0);
}

#[test]
fn test_derived_specs_serialize_as_configuration() {
    let derivation =
        derive(&analyze(&departments()), &DerivationPolicy::with_tolerance(0.2)).unwrap();
    let json = serde_json::to_string(&derivation.specs).unwrap();
    let parsed: Vec<ConstraintSpec> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.len(), derivation.specs.len());
    for spec in &parsed {
        assert!(spec.build().is_ok());
    }
}
