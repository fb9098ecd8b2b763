//! Integration tests for the sweep driver and its configuration

mod common;

use matbench::config::SuiteConfig;
use matbench::error::Error;
use matbench::library::LibraryRegistry;
use matbench::operation::OperationKind;
use matbench::suite::{CaseOutcome, run_suite};

fn config(libraries: Vec<String>, operations: Vec<OperationKind>) -> SuiteConfig {
    SuiteConfig {
        dimensions: vec![4, 9],
        libraries,
        operations,
        iterations: 2,
        verify_interval: 1,
        ..SuiteConfig::default()
    }
}

#[test]
fn test_full_sweep_has_no_untrustworthy_results() {
    let keys: Vec<String> = common::library_keys().into_iter().map(String::from).collect();
    let cfg = config(keys.clone(), OperationKind::ALL.to_vec());
    let report = run_suite(&cfg, &LibraryRegistry::with_defaults()).unwrap();

    assert_eq!(report.cases().len(), keys.len() * 2 * OperationKind::ALL.len());
    assert_eq!(report.untrustworthy().count(), 0, "{report}");
    assert_eq!(report.failed().count(), 0, "{report}");
    for case in report.completed() {
        assert!(
            matches!(case.outcome, CaseOutcome::Completed { verified: 2, .. }),
            "{case:?}"
        );
    }
    // ndarray declines six of the ten operations at each dimension
    let expected_skips = if keys.iter().any(|k| k == "ndarray") { 12 } else { 0 };
    assert_eq!(report.skipped().count(), expected_skips);
}

#[test]
fn test_cases_ordered_by_library_then_dimension() {
    let cfg = config(
        vec!["native".to_string()],
        vec![OperationKind::Add, OperationKind::Determinant],
    );
    let report = run_suite(&cfg, &LibraryRegistry::with_defaults()).unwrap();
    let order: Vec<(usize, OperationKind)> = report
        .cases()
        .iter()
        .map(|c| (c.dim, c.operation))
        .collect();
    assert_eq!(
        order,
        vec![
            (4, OperationKind::Add),
            (4, OperationKind::Determinant),
            (9, OperationKind::Add),
            (9, OperationKind::Determinant),
        ]
    );
}

#[test]
fn test_strict_tolerance_marks_results_untrustworthy() {
    // A residual tolerance this tight cannot be met by a floating point solve
    let mut cfg = config(vec!["native".to_string()], vec![OperationKind::Solve]);
    cfg.tolerance_factor = 1e-12;
    cfg.dimensions = vec![30];
    let report = run_suite(&cfg, &LibraryRegistry::with_defaults()).unwrap();
    assert_eq!(report.untrustworthy().count(), 1);
    assert!(report.to_string().contains("UNTRUSTWORTHY"));
}

#[test]
fn test_config_from_lookup_drives_suite() {
    let cfg = SuiteConfig::from_lookup(|key| match key {
        "MATBENCH_DIMS" => Some("5".to_string()),
        "MATBENCH_LIBS" => Some("native".to_string()),
        "MATBENCH_OPS" => Some("multiplymutate, pinv".to_string()),
        "MATBENCH_ITERATIONS" => Some("1".to_string()),
        _ => None,
    })
    .unwrap();
    let report = run_suite(&cfg, &LibraryRegistry::with_defaults()).unwrap();
    assert_eq!(report.completed().count(), 2);
}

#[test]
fn test_empty_libraries_rejected() {
    let cfg = config(Vec::new(), vec![OperationKind::Add]);
    assert!(matches!(
        run_suite(&cfg, &LibraryRegistry::with_defaults()),
        Err(Error::Config(_))
    ));
}
