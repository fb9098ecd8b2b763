//! Common test utilities
#![allow(dead_code)]

use matbench::library::LibraryRegistry;
use matbench::reference::ReferenceMatrix;

/// Every library key compiled into this build
pub fn library_keys() -> Vec<&'static str> {
    LibraryRegistry::with_defaults().keys().collect()
}

/// Libraries with the full decomposition set
pub fn full_libraries() -> Vec<&'static str> {
    library_keys()
        .into_iter()
        .filter(|key| *key != "ndarray")
        .collect()
}

/// Row-major entries of a reference matrix
pub fn flatten(m: &ReferenceMatrix) -> Vec<f64> {
    m.as_rows().iter().flatten().copied().collect()
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Assert `m` is the identity within `tol`
pub fn assert_near_identity(m: &ReferenceMatrix, tol: f64, msg: &str) {
    let (rows, cols) = m.shape();
    assert_eq!(rows, cols, "{}: not square", msg);
    for i in 0..rows {
        for j in 0..cols {
            let expected = if i == j { 1.0 } else { 0.0 };
            let actual = m.get(i, j);
            assert!(
                (actual - expected).abs() <= tol,
                "{}: element [{},{}] differs: {} vs {}",
                msg,
                i,
                j,
                actual,
                expected
            );
        }
    }
}
