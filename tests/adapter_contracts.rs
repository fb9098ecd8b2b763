//! Integration tests for the library adapters
//!
//! Tests verify, for every compiled-in adapter:
//! - Exact conversion to and from the interchange format
//! - Shape validation before numerical work
//! - Repeated calls overwrite targets instead of accumulating
//! - Retained buffers are reused, not reallocated
//! - The LU solver handles non-symmetric bodies
//! - Declined operations report the unsupported condition

mod common;

use matbench::error::Error;
use matbench::library::LibraryAdapter;
use matbench::library::native::NativeLibrary;
use matbench::matrix::MatrixHandle;
use matbench::operation::OperationKind;
use matbench::reference::{EntryDistribution, RandomSource, ReferenceMatrix};

// ============================================================================
// Generic checks
// ============================================================================

fn check_round_trip<L: LibraryAdapter>(lib: &L) {
    let reference = ReferenceMatrix::new(vec![
        vec![1.5, -0.0, f64::MIN_POSITIVE],
        vec![1e300, -7.25, 0.1],
    ])
    .unwrap();
    let handle = lib.from_reference(&reference);
    assert_eq!(handle.shape(), (2, 3), "{}", lib.name());
    assert!(
        lib.to_reference(&handle).bit_identical(&reference),
        "{}: round trip changed bits",
        lib.name()
    );
}

fn check_builder<L: LibraryAdapter>(lib: &L) {
    let mut builder = lib.builder(3, 2);
    builder.set(2, 1, 4.0).set(0, 0, -1.0);
    let m = builder.build();
    let r = lib.to_reference(&m);
    assert_eq!(
        common::flatten(&r),
        vec![-1.0, 0.0, 0.0, 0.0, 0.0, 4.0],
        "{}",
        lib.name()
    );
}

fn check_fill_rejects_bad_target<L: LibraryAdapter>(lib: &L) {
    let a = lib.from_reference(&ReferenceMatrix::zeros(2, 3));
    let b = lib.from_reference(&ReferenceMatrix::zeros(3, 4));
    let mut target = lib.builder(2, 3).build();
    let err = lib
        .operation_fill_by_multiplying()
        .unwrap()
        .execute(&a, &b, &mut target)
        .unwrap_err();
    assert_eq!(err, Error::shape_mismatch((2, 4), (2, 3)), "{}", lib.name());
}

fn check_add_rejects_mismatched_operands<L: LibraryAdapter>(lib: &L) {
    let a = lib.from_reference(&ReferenceMatrix::zeros(2, 2));
    let b = lib.from_reference(&ReferenceMatrix::zeros(3, 2));
    let mut target = lib.builder(2, 2).build();
    let err = lib
        .operation_add()
        .unwrap()
        .execute(&a, &b, &mut target)
        .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }), "{}", lib.name());
}

fn check_scale<L: LibraryAdapter>(lib: &L) {
    let input = lib.from_reference(
        &ReferenceMatrix::new(vec![vec![1.0, -2.0], vec![0.5, 0.0]]).unwrap(),
    );
    let mut target = lib.builder(2, 2).build();
    lib.operation_scale()
        .unwrap()
        .execute(&input, 2.0, &mut target)
        .unwrap();
    assert_eq!(
        common::flatten(&lib.to_reference(&target)),
        vec![2.0, -4.0, 1.0, 0.0],
        "{}",
        lib.name()
    );
}

fn check_multiply_helpers<L: LibraryAdapter>(lib: &L) {
    let a = lib.from_reference(
        &ReferenceMatrix::new(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap(),
    );
    let at = lib.transpose(&a);
    let gram = lib.multiply(&[&a, &at]).unwrap();
    assert_eq!(
        common::flatten(&lib.to_reference(&gram)),
        vec![14.0, 32.0, 32.0, 77.0],
        "{}",
        lib.name()
    );
    assert!(lib.multiply(&[&a, &a]).is_err(), "{}", lib.name());

    let mut copy = lib.builder(2, 3).build();
    lib.copy(&a, &mut copy).unwrap();
    assert_eq!(lib.norm(&lib.subtract(&a, &copy).unwrap()), 0.0);
}

fn check_fill_is_idempotent<L: LibraryAdapter>(lib: &L) {
    let a = lib.from_reference(
        &ReferenceMatrix::new(vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]]).unwrap(),
    );
    let b = lib.transpose(&a);
    let mut fill = lib.operation_fill_by_multiplying().unwrap();
    let mut target = lib.builder(2, 2).build();

    fill.execute(&a, &b, &mut target).unwrap();
    let first = lib.to_reference(&target);
    fill.execute(&a, &b, &mut target).unwrap();
    assert!(
        lib.to_reference(&target).bit_identical(&first),
        "{}: second call accumulated into the target",
        lib.name()
    );
}

fn check_general_solve<L: LibraryAdapter>(lib: &L) {
    let mut source = RandomSource::new(40, 11, EntryDistribution::Normal);
    let a = source.general(40, 40);
    assert_ne!(a, a.transpose());
    let b = source.general(40, 3);

    let mut solver = lib.operation_equation_system_solver(40, 40, 3, false).unwrap();
    let (body, rhs) = (lib.from_reference(&a), lib.from_reference(&b));
    let x = lib.to_reference(solver.execute(&body, &rhs).unwrap());
    assert_eq!(x.shape(), (40, 3), "{}", lib.name());

    let relative = a.multiply(&x).unwrap().sub(&b).unwrap().frobenius_norm() / b.frobenius_norm();
    assert!(relative < 1e-9, "{}: {relative}", lib.name());

    // symmetric but indefinite: Cholesky refuses it, LU does not
    let indefinite = ReferenceMatrix::new(vec![vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
    let ones = ReferenceMatrix::new(vec![vec![1.0], vec![1.0]]).unwrap();
    let mut solver = lib.operation_equation_system_solver(2, 2, 1, false).unwrap();
    let x = lib.to_reference(
        solver
            .execute(&lib.from_reference(&indefinite), &lib.from_reference(&ones))
            .unwrap(),
    );
    common::assert_allclose_f64(
        &common::flatten(&x),
        &[1.0 / 3.0, 1.0 / 3.0],
        1e-14,
        1e-15,
        lib.name(),
    );
}

fn check_all<L: LibraryAdapter>(lib: L) {
    check_round_trip(&lib);
    check_builder(&lib);
    check_fill_rejects_bad_target(&lib);
    check_add_rejects_mismatched_operands(&lib);
    check_scale(&lib);
    check_multiply_helpers(&lib);
    check_fill_is_idempotent(&lib);
}

// ============================================================================
// Per-library
// ============================================================================

#[test]
fn test_native_contracts() {
    check_all(NativeLibrary);
}

#[cfg(feature = "nalgebra")]
#[test]
fn test_nalgebra_contracts() {
    check_all(matbench::library::nalgebra::NalgebraLibrary);
}

#[test]
fn test_native_general_solve() {
    check_general_solve(&NativeLibrary);
}

#[cfg(feature = "nalgebra")]
#[test]
fn test_nalgebra_general_solve() {
    check_general_solve(&matbench::library::nalgebra::NalgebraLibrary);
}

#[cfg(feature = "ndarray")]
#[test]
fn test_ndarray_contracts() {
    check_all(matbench::library::ndarray::NdarrayLibrary);
}

#[cfg(feature = "ndarray")]
#[test]
fn test_ndarray_declines_decompositions() {
    let lib = matbench::library::ndarray::NdarrayLibrary;
    let declined = [
        (lib.operation_pseudoinverse(5).err(), OperationKind::Pseudoinverse),
        (lib.operation_svd(5).err(), OperationKind::Svd),
        (lib.operation_evd(5).err(), OperationKind::EigenDecomposition),
        (lib.operation_eigenvectors(5).err(), OperationKind::Eigenvectors),
        (lib.operation_determinant(5).err(), OperationKind::Determinant),
        (
            lib.operation_equation_system_solver(5, 5, 1, true).err(),
            OperationKind::Solve,
        ),
    ];
    for (err, operation) in declined {
        assert_eq!(
            err,
            Some(Error::UnsupportedOperation {
                library: "ndarray",
                operation
            })
        );
    }
}

#[test]
fn test_retained_outputs_are_reused() {
    let lib = NativeLibrary;
    let a = lib.from_reference(
        &ReferenceMatrix::new(vec![vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap(),
    );

    let mut eigenvectors = lib.operation_eigenvectors(2).unwrap();
    let first = eigenvectors.execute(&a).unwrap() as *const _;
    let second = eigenvectors.execute(&a).unwrap() as *const _;
    assert_eq!(first, second);

    let mut svd = lib.operation_svd(2).unwrap();
    let first = svd.execute(&a).unwrap() as *const _;
    let second = svd.execute(&a).unwrap() as *const _;
    assert_eq!(first, second);
}

#[test]
fn test_decomposition_rejects_wrong_order() {
    let lib = NativeLibrary;
    let a = lib.from_reference(&ReferenceMatrix::zeros(3, 3));
    assert!(matches!(
        lib.operation_evd(4).unwrap().execute(&a),
        Err(Error::ShapeMismatch { .. })
    ));
    assert!(matches!(
        lib.operation_pseudoinverse(2).unwrap().execute(&a),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn test_cholesky_solver_rejects_indefinite_body() {
    let lib = NativeLibrary;
    let body = lib.from_reference(
        &ReferenceMatrix::new(vec![vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap(),
    );
    let rhs = lib.from_reference(&ReferenceMatrix::new(vec![vec![1.0], vec![1.0]]).unwrap());
    let mut solver = lib.operation_equation_system_solver(2, 2, 1, true).unwrap();
    assert!(matches!(
        solver.execute(&body, &rhs),
        Err(Error::Numerical { .. })
    ));
}
