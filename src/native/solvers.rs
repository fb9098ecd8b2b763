//! Triangular solves against LU and Cholesky factors

/// Solve `A X = B` given the LU factors of `A`.
///
/// `x` holds `B` (`n × nrhs`, row-major) on entry and `X` on return.
pub fn lu_solve_in_place(lu: &[f64], n: usize, pivots: &[usize], x: &mut [f64], nrhs: usize) {
    debug_assert_eq!(x.len(), n * nrhs);

    // Apply the row permutation in factorization order
    for (i, &pivot_row) in pivots.iter().enumerate() {
        if pivot_row != i {
            for r in 0..nrhs {
                x.swap(i * nrhs + r, pivot_row * nrhs + r);
            }
        }
    }

    // Forward substitution: L y = P b (unit diagonal)
    for i in 0..n {
        for j in 0..i {
            let l_ij = lu[i * n + j];
            if l_ij != 0.0 {
                for r in 0..nrhs {
                    x[i * nrhs + r] -= l_ij * x[j * nrhs + r];
                }
            }
        }
    }

    // Backward substitution: U x = y
    for i in (0..n).rev() {
        for j in (i + 1)..n {
            let u_ij = lu[i * n + j];
            if u_ij != 0.0 {
                for r in 0..nrhs {
                    x[i * nrhs + r] -= u_ij * x[j * nrhs + r];
                }
            }
        }
        let diag = lu[i * n + i];
        for r in 0..nrhs {
            x[i * nrhs + r] /= diag;
        }
    }
}

/// Solve `A X = B` given the Cholesky factor L (lower triangle of `l`).
///
/// `x` holds `B` (`n × nrhs`, row-major) on entry and `X` on return.
pub fn cholesky_solve_in_place(l: &[f64], n: usize, x: &mut [f64], nrhs: usize) {
    debug_assert_eq!(x.len(), n * nrhs);

    // L y = b
    for i in 0..n {
        for j in 0..i {
            let l_ij = l[i * n + j];
            for r in 0..nrhs {
                x[i * nrhs + r] -= l_ij * x[j * nrhs + r];
            }
        }
        let diag = l[i * n + i];
        for r in 0..nrhs {
            x[i * nrhs + r] /= diag;
        }
    }

    // Lᵀ x = y
    for i in (0..n).rev() {
        for j in (i + 1)..n {
            let l_ji = l[j * n + i];
            for r in 0..nrhs {
                x[i * nrhs + r] -= l_ji * x[j * nrhs + r];
            }
        }
        let diag = l[i * n + i];
        for r in 0..nrhs {
            x[i * nrhs + r] /= diag;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::decompositions::{cholesky_in_place, lu_in_place};
    use super::*;

    #[test]
    fn test_lu_solve_2x2() {
        // A = [[2, 1], [1, 2]], b = [3, 3] -> x = [1, 1]
        let mut lu = vec![2.0, 1.0, 1.0, 2.0];
        let mut pivots = vec![0; 2];
        lu_in_place(&mut lu, 2, &mut pivots).unwrap();
        let mut x = vec![3.0, 3.0];
        lu_solve_in_place(&lu, 2, &pivots, &mut x, 1);
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lu_solve_with_pivoting_multiple_rhs() {
        // A = [[0, 1], [1, 0]] swaps the rows of B
        let mut lu = vec![0.0, 1.0, 1.0, 0.0];
        let mut pivots = vec![0; 2];
        lu_in_place(&mut lu, 2, &mut pivots).unwrap();
        let mut x = vec![1.0, 2.0, 3.0, 4.0];
        lu_solve_in_place(&lu, 2, &pivots, &mut x, 2);
        assert_eq!(x, vec![3.0, 4.0, 1.0, 2.0]);
    }

    #[test]
    fn test_cholesky_solve_3x3() {
        // A = [[4, 2, 0], [2, 5, 1], [0, 1, 3]], x = [1, -1, 2]
        let a = [4.0, 2.0, 0.0, 2.0, 5.0, 1.0, 0.0, 1.0, 3.0];
        let expected = [1.0, -1.0, 2.0];
        let mut b = vec![0.0; 3];
        for i in 0..3 {
            b[i] = (0..3).map(|j| a[i * 3 + j] * expected[j]).sum();
        }
        let mut l = a.to_vec();
        cholesky_in_place(&mut l, 3).unwrap();
        cholesky_solve_in_place(&l, 3, &mut b, 1);
        for (x, e) in b.iter().zip(expected) {
            assert!((x - e).abs() < 1e-12);
        }
    }
}
