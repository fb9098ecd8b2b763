//! Integration tests for the benchmark lifecycle and cross-library behavior
//!
//! Tests verify:
//! - State transitions and invalid-state rejection
//! - All libraries receive bit-identical inputs
//! - Inputs are never modified by execution
//! - Decomposition results meet residual bounds
//! - Results agree across libraries

mod common;

use common::{assert_allclose_f64, assert_near_identity, flatten, full_libraries, library_keys};
use matbench::benchmark::{BenchmarkOperation, BenchmarkParams, LifecycleState, Problem};
use matbench::error::Error;
use matbench::library::LibraryRegistry;
use matbench::operation::OperationKind;
use matbench::reference::{EntryDistribution, ReferenceMatrix};

fn ready(library: &str, operation: OperationKind, dim: usize) -> BenchmarkOperation {
    let registry = LibraryRegistry::with_defaults();
    let mut op = BenchmarkOperation::new(BenchmarkParams::new(library, operation, dim));
    op.setup(&registry).unwrap();
    op
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_setup_from_uninitialized_configures_first() {
    let mut op = BenchmarkOperation::new(BenchmarkParams::new("native", OperationKind::Add, 3));
    assert_eq!(op.state(), LifecycleState::Uninitialized);
    op.setup(&LibraryRegistry::with_defaults()).unwrap();
    assert_eq!(op.state(), LifecycleState::Ready);
}

#[test]
fn test_setup_twice_is_invalid_state() {
    let registry = LibraryRegistry::with_defaults();
    let mut op = ready("native", OperationKind::Scale, 3);
    assert_eq!(
        op.setup(&registry).unwrap_err(),
        Error::InvalidState {
            expected: "Configured",
            actual: "Ready"
        }
    );
}

#[test]
fn test_after_teardown_everything_is_invalid() {
    let mut op = ready("native", OperationKind::Svd, 4);
    op.execute().unwrap();
    op.teardown().unwrap();
    assert!(matches!(op.execute(), Err(Error::InvalidState { .. })));
    assert!(matches!(op.verify(), Err(Error::InvalidState { .. })));
    assert!(matches!(op.outputs(), Err(Error::InvalidState { .. })));
}

#[test]
fn test_unsupported_operation_keeps_instance_configured() {
    if !library_keys().contains(&"ndarray") {
        return;
    }
    let mut op =
        BenchmarkOperation::new(BenchmarkParams::new("ndarray", OperationKind::Pseudoinverse, 8));
    let err = op.setup(&LibraryRegistry::with_defaults()).unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(op.state(), LifecycleState::Configured);
}

#[test]
fn test_verify_before_execute_runs_once() {
    for library in full_libraries() {
        let mut op = ready(library, OperationKind::Determinant, 6);
        assert!(op.verify().unwrap().passed(), "{library}");
    }
}

// ============================================================================
// Inputs
// ============================================================================

#[test]
fn test_inputs_bit_identical_across_libraries() {
    for operation in OperationKind::ALL {
        let expected = Problem::generate(operation, 9, matbench::benchmark::DEFAULT_SEED).unwrap();
        for library in library_keys() {
            let registry = LibraryRegistry::with_defaults();
            let mut op = BenchmarkOperation::new(BenchmarkParams::new(library, operation, 9));
            match op.setup(&registry) {
                Ok(()) => {}
                Err(err) if err.is_unsupported() => continue,
                Err(err) => panic!("{library}/{operation}: {err}"),
            }
            let inputs = op.inputs().unwrap();
            assert_eq!(inputs.len(), expected.operands().len());
            for (got, want) in inputs.iter().zip(expected.operands()) {
                assert!(got.bit_identical(want), "{library}/{operation}");
            }
        }
    }
}

#[test]
fn test_execution_never_mutates_inputs() {
    for library in library_keys() {
        for operation in [
            OperationKind::Add,
            OperationKind::Scale,
            OperationKind::MultiplyProduce,
            OperationKind::MultiplyMutate,
        ] {
            let mut op = ready(library, operation, 7);
            let before = op.inputs().unwrap();
            for _ in 0..4 {
                op.execute().unwrap();
            }
            let after = op.inputs().unwrap();
            for (b, a) in before.iter().zip(&after) {
                assert!(b.bit_identical(a), "{library}/{operation}");
            }
            assert!(op.verify().unwrap().passed(), "{library}/{operation}");
        }
    }
}

#[test]
fn test_normal_entries_change_inputs_not_validity() {
    let registry = LibraryRegistry::with_defaults();
    let params = BenchmarkParams::new("native", OperationKind::Solve, 12)
        .with_distribution(EntryDistribution::Normal)
        .with_seed(3);
    let mut op = BenchmarkOperation::new(params);
    op.setup(&registry).unwrap();
    let uniform = Problem::generate(OperationKind::Solve, 12, 3).unwrap();
    assert!(!op.inputs().unwrap()[1].bit_identical(&uniform.operands()[1]));
    op.execute().unwrap();
    assert!(op.verify().unwrap().passed());
}

// ============================================================================
// Residual bounds
// ============================================================================

#[test]
fn test_spd_solve_relative_residual() {
    for library in full_libraries() {
        let mut op = ready(library, OperationKind::Solve, 50);
        op.execute().unwrap();
        let inputs = op.inputs().unwrap();
        let (a, b) = (&inputs[0], &inputs[1]);
        let x = op.outputs().unwrap().remove(0);
        assert_eq!(x.shape(), (50, 1));

        let residual = a.multiply(&x).unwrap().sub(b).unwrap().frobenius_norm();
        let relative = residual / b.frobenius_norm();
        assert!(relative < 1e-9, "{library}: {relative}");
        op.verify().unwrap();
    }
}

#[test]
fn test_evd_reconstruction() {
    for library in full_libraries() {
        let mut op = ready(library, OperationKind::EigenDecomposition, 20);
        op.execute().unwrap();
        let a = op.inputs().unwrap().remove(0);
        let outputs = op.outputs().unwrap();
        let (d, v) = (&outputs[0], &outputs[1]);

        let rebuilt = v.multiply(d).unwrap().multiply(&v.transpose()).unwrap();
        let relative = a.sub(&rebuilt).unwrap().frobenius_norm() / a.frobenius_norm();
        assert!(relative < 1e-8, "{library}: {relative}");
        assert_near_identity(&v.transpose().multiply(v).unwrap(), 1e-10, library);
        assert!(op.verify().unwrap().passed(), "{library}");
    }
}

#[test]
fn test_svd_factors() {
    for library in full_libraries() {
        let mut op = ready(library, OperationKind::Svd, 15);
        let outputs = op.outputs().unwrap();
        let (u, s, vt) = (&outputs[0], &outputs[1], &outputs[2]);

        for i in 0..15 {
            assert!(s.get(i, i) >= 0.0, "{library}: negative singular value");
            for j in 0..15 {
                if i != j {
                    assert_eq!(s.get(i, j), 0.0, "{library}: Σ not diagonal");
                }
            }
        }
        assert_near_identity(&u.transpose().multiply(u).unwrap(), 1e-10, library);
        assert_near_identity(&vt.multiply(&vt.transpose()).unwrap(), 1e-10, library);
        assert!(op.verify().unwrap().passed(), "{library}");
    }
}

#[test]
fn test_pseudoinverse_of_invertible_matrix_is_inverse() {
    for library in full_libraries() {
        let mut op = ready(library, OperationKind::Pseudoinverse, 10);
        let a = op.inputs().unwrap().remove(0);
        let pinv = op.outputs().unwrap().remove(0);
        assert_near_identity(&a.multiply(&pinv).unwrap(), 1e-8, library);
        assert!(op.verify().unwrap().passed(), "{library}");
    }
}

#[test]
fn test_eigenvectors_verify_at_several_sizes() {
    for library in full_libraries() {
        for dim in [1, 2, 17] {
            let mut op = ready(library, OperationKind::Eigenvectors, dim);
            op.execute().unwrap();
            let v = op.verify().unwrap();
            assert!(v.passed(), "{library}@{dim}: {} > {}", v.residual, v.tolerance);
        }
    }
}

// ============================================================================
// Cross-library agreement
// ============================================================================

#[test]
fn test_products_agree_across_libraries() {
    let outputs: Vec<(&str, ReferenceMatrix)> = library_keys()
        .into_iter()
        .map(|library| {
            let mut op = ready(library, OperationKind::MultiplyProduce, 16);
            op.execute().unwrap();
            (library, op.outputs().unwrap().remove(0))
        })
        .collect();
    let (_, baseline) = &outputs[0];
    for (library, product) in &outputs[1..] {
        assert_allclose_f64(&flatten(product), &flatten(baseline), 1e-12, 1e-12, library);
    }
}

#[test]
fn test_determinants_agree_across_libraries() {
    let values: Vec<(&str, f64)> = full_libraries()
        .into_iter()
        .map(|library| {
            let mut op = ready(library, OperationKind::Determinant, 10);
            (library, op.outputs().unwrap()[0].get(0, 0))
        })
        .collect();
    for (library, value) in &values[1..] {
        assert_allclose_f64(&[*value], &[values[0].1], 1e-9, 0.0, library);
    }
}

#[test]
fn test_large_determinant_stays_finite() {
    for library in full_libraries() {
        let mut op = ready(library, OperationKind::Determinant, 500);
        let check = op.verify().unwrap();
        let value = op.outputs().unwrap()[0].get(0, 0);
        assert!(value.is_finite() && value != 0.0, "{library}: {value}");
        assert!(check.residual.is_finite(), "{library}: {check:?}");
        assert!(
            check.tolerance.is_finite() && check.tolerance > 0.0,
            "{library}: {check:?}"
        );
        assert!(check.passed(), "{library}: {check:?}");
    }
}
