//! LU and Cholesky factorizations, in place on row-major buffers

use crate::error::{Error, Result};

/// LU decomposition with partial pivoting (Doolittle), in place.
///
/// On return `lu` holds L below the diagonal (unit diagonal implied) and U on
/// and above it; `pivots[i]` is the row swapped with row `i`. Returns the
/// number of row swaps, for the determinant sign.
pub fn lu_in_place(lu: &mut [f64], n: usize, pivots: &mut [usize]) -> Result<usize> {
    debug_assert_eq!(lu.len(), n * n);
    debug_assert_eq!(pivots.len(), n);
    let mut num_swaps = 0usize;

    for col in 0..n {
        // Pivot: max |value| in column col, rows col..n
        let mut pivot_row = col;
        let mut max_val = lu[col * n + col].abs();
        for row in (col + 1)..n {
            let val = lu[row * n + col].abs();
            if val > max_val {
                max_val = val;
                pivot_row = row;
            }
        }

        pivots[col] = pivot_row;
        if pivot_row != col {
            for j in 0..n {
                lu.swap(col * n + j, pivot_row * n + j);
            }
            num_swaps += 1;
        }

        let pivot = lu[col * n + col];
        if pivot == 0.0 {
            return Err(Error::numerical("LU decomposition", "matrix is singular"));
        }

        for row in (col + 1)..n {
            lu[row * n + col] /= pivot;
        }

        // Update trailing submatrix
        for row in (col + 1)..n {
            let multiplier = lu[row * n + col];
            if multiplier == 0.0 {
                continue;
            }
            for j in (col + 1)..n {
                lu[row * n + j] -= multiplier * lu[col * n + j];
            }
        }
    }

    Ok(num_swaps)
}

/// Cholesky decomposition (Cholesky-Banachiewicz), in place.
///
/// Overwrites the lower triangle of `a` with L such that `A = L @ Lᵀ`. Only
/// the lower triangle of the input is read; the upper triangle is left as is.
pub fn cholesky_in_place(a: &mut [f64], n: usize) -> Result<()> {
    debug_assert_eq!(a.len(), n * n);

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= a[i * n + k] * a[j * n + k];
            }

            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(Error::numerical(
                        "Cholesky decomposition",
                        "matrix is not positive definite",
                    ));
                }
                a[i * n + i] = sum.sqrt();
            } else {
                a[i * n + j] = sum / a[j * n + j];
            }
        }
    }

    Ok(())
}

/// Determinant from an LU factorization: `(-1)^swaps · Π U[i,i]`
pub fn lu_determinant(lu: &[f64], n: usize, num_swaps: usize) -> f64 {
    let sign = if num_swaps % 2 == 0 { 1.0 } else { -1.0 };
    (0..n).fold(sign, |det, i| det * lu[i * n + i])
}

/// Determinant of the matrix held in `lu`, destroying it.
///
/// An exactly singular matrix has determinant zero rather than failing.
pub fn determinant_in_place(lu: &mut [f64], n: usize, pivots: &mut [usize]) -> f64 {
    match lu_in_place(lu, n, pivots) {
        Ok(num_swaps) => lu_determinant(lu, n, num_swaps),
        Err(_) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lu_2x2() {
        // A = [[4, 3], [6, 3]] pivots to [[6, 3], [4, 3]]
        let mut lu = vec![4.0, 3.0, 6.0, 3.0];
        let mut pivots = vec![0; 2];
        let swaps = lu_in_place(&mut lu, 2, &mut pivots).unwrap();
        assert_eq!(swaps, 1);
        assert_eq!(pivots, vec![1, 1]);
        assert!((lu_determinant(&lu, 2, swaps) - (-6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_lu_singular() {
        let mut lu = vec![1.0, 2.0, 2.0, 4.0];
        let mut pivots = vec![0; 2];
        let err = lu_in_place(&mut lu, 2, &mut pivots).unwrap_err();
        assert!(matches!(err, Error::Numerical { .. }));
    }

    #[test]
    fn test_determinant_in_place() {
        let mut a = vec![2.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 4.0];
        let mut pivots = vec![0; 3];
        assert!((determinant_in_place(&mut a, 3, &mut pivots) - 24.0).abs() < 1e-12);

        let mut singular = vec![1.0, 2.0, 2.0, 4.0];
        assert_eq!(determinant_in_place(&mut singular, 2, &mut pivots[..2]), 0.0);
    }

    #[test]
    fn test_cholesky_2x2() {
        // A = [[4, 2], [2, 2]], L = [[2, 0], [1, 1]]
        let mut a = vec![4.0, 2.0, 2.0, 2.0];
        cholesky_in_place(&mut a, 2).unwrap();
        assert!((a[0] - 2.0).abs() < 1e-12);
        assert!((a[2] - 1.0).abs() < 1e-12);
        assert!((a[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let mut a = vec![1.0, 2.0, 2.0, 1.0];
        assert!(cholesky_in_place(&mut a, 2).is_err());
    }
}
