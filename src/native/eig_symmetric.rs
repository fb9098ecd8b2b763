//! Eigendecomposition for symmetric matrices using the cyclic Jacobi algorithm

use super::jacobi::{
    JacobiRotation, apply_rotation_to_columns, apply_two_sided_rotation, argsort_desc_by,
    fill_identity,
};
use crate::error::{Error, Result};

const MAX_SWEEPS: usize = 30;

/// Scratch buffers for a fixed order `n`, allocated once.
#[derive(Debug, Clone)]
pub struct SymmetricEigenWorkspace {
    n: usize,
    work: Vec<f64>,
    vectors: Vec<f64>,
    values: Vec<f64>,
    order: Vec<usize>,
}

impl SymmetricEigenWorkspace {
    /// Workspace for `n × n` inputs
    pub fn new(n: usize) -> Self {
        Self {
            n,
            work: vec![0.0; n * n],
            vectors: vec![0.0; n * n],
            values: vec![0.0; n],
            order: vec![0; n],
        }
    }

    /// Order of the matrices this workspace accepts
    pub fn order(&self) -> usize {
        self.n
    }

    /// Decompose the symmetric `a`, writing eigenvalues and eigenvectors
    /// (as columns) into the output buffers.
    ///
    /// Only the lower triangle of `a` is read. Eigenvalues are sorted by
    /// descending magnitude with the eigenvector columns reordered to match.
    ///
    /// Algorithm:
    /// 1. V = I
    /// 2. Up to 30 sweeps over all pairs (p, q), p < q:
    ///    rotate away A[p,q] when |A[p,q]| exceeds ε·√n·‖A‖_F, accumulating V = V @ J
    /// 3. Stop after a sweep that applies no rotation
    /// 4. eigenvalues = diag(A)
    pub fn decompose(
        &mut self,
        a: &[f64],
        values_out: &mut [f64],
        vectors_out: &mut [f64],
    ) -> Result<()> {
        let n = self.n;
        debug_assert_eq!(a.len(), n * n);
        debug_assert_eq!(values_out.len(), n);
        debug_assert_eq!(vectors_out.len(), n * n);

        // Symmetrize from the lower triangle
        let work = &mut self.work;
        let mut norm_sq = 0.0;
        for i in 0..n {
            for j in 0..=i {
                let val = a[i * n + j];
                work[i * n + j] = val;
                work[j * n + i] = val;
                norm_sq += if i == j { val * val } else { 2.0 * val * val };
            }
        }
        if !norm_sq.is_finite() {
            return Err(Error::numerical(
                "symmetric eigendecomposition",
                "input contains non-finite values",
            ));
        }

        fill_identity(&mut self.vectors, n);
        let tol = f64::EPSILON * norm_sq.sqrt() * (n as f64).sqrt();

        for _sweep in 0..MAX_SWEEPS {
            let mut rotations = 0usize;

            for p in 0..n {
                for q in (p + 1)..n {
                    let a_pq = work[p * n + q];
                    if a_pq.abs() <= tol {
                        continue;
                    }

                    let a_pp = work[p * n + p];
                    let a_qq = work[q * n + q];
                    let rot = JacobiRotation::compute(a_pp, a_qq, a_pq);

                    apply_two_sided_rotation(work, n, p, q, &rot, a_pp, a_qq, a_pq);
                    apply_rotation_to_columns(&mut self.vectors, n, n, p, q, &rot);
                    rotations += 1;
                }
            }

            if rotations == 0 {
                break;
            }
        }

        for i in 0..n {
            self.values[i] = work[i * n + i];
        }
        argsort_desc_by(&mut self.order, &self.values, f64::abs);

        for (new_idx, &old_idx) in self.order.iter().enumerate() {
            values_out[new_idx] = self.values[old_idx];
            for i in 0..n {
                vectors_out[i * n + new_idx] = self.vectors[i * n + old_idx];
            }
        }

        Ok(())
    }
}
