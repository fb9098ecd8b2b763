//! Singular Value Decomposition (SVD) using the One-Sided Jacobi algorithm

use super::jacobi::{
    JacobiRotation, apply_rotation_to_columns, argsort_desc_by, compute_gram_elements,
    fill_identity,
};
use crate::error::{Error, Result};

const MAX_SWEEPS: usize = 30;

/// Scratch buffers for a fixed `m × n` shape (`m >= n`), allocated once.
#[derive(Debug, Clone)]
pub struct SvdWorkspace {
    m: usize,
    n: usize,
    b: Vec<f64>,
    v: Vec<f64>,
    norms: Vec<f64>,
    order: Vec<usize>,
}

impl SvdWorkspace {
    /// Workspace for `m × n` inputs. Wide matrices are rejected.
    pub fn new(m: usize, n: usize) -> Result<Self> {
        if m < n {
            return Err(Error::invalid_argument(
                "shape",
                format!("one-sided Jacobi SVD needs rows >= cols, got {m}x{n}"),
            ));
        }
        Ok(Self {
            m,
            n,
            b: vec![0.0; m * n],
            v: vec![0.0; n * n],
            norms: vec![0.0; n],
            order: vec![0; n],
        })
    }

    /// `(rows, cols)` accepted by this workspace
    pub fn shape(&self) -> (usize, usize) {
        (self.m, self.n)
    }

    /// Decompose `a` into `U [m × n]`, `S [n]` and `Vᵗ [n × n]`.
    ///
    /// Algorithm:
    /// 1. B = A, V = I
    /// 2. Up to 30 sweeps over column pairs (p, q), p < q:
    ///    - Gram entries a_pp, a_qq, a_pq of B[:,p], B[:,q]
    ///    - if |a_pq| > √m·ε·sqrt(a_pp·a_qq): rotate columns of B and V
    /// 3. Stop after a sweep that applies no rotation
    /// 4. S[j] = ‖B[:,j]‖, U[:,j] = B[:,j] / S[j]
    /// 5. Sort S descending, reorder U and V columns, emit Vᵗ
    pub fn decompose(
        &mut self,
        a: &[f64],
        u_out: &mut [f64],
        s_out: &mut [f64],
        vt_out: &mut [f64],
    ) -> Result<()> {
        let (m, n) = (self.m, self.n);
        debug_assert_eq!(a.len(), m * n);
        debug_assert_eq!(u_out.len(), m * n);
        debug_assert_eq!(s_out.len(), n);
        debug_assert_eq!(vt_out.len(), n * n);

        if a.iter().any(|x| !x.is_finite()) {
            return Err(Error::numerical("SVD", "input contains non-finite values"));
        }

        self.b.copy_from_slice(a);
        fill_identity(&mut self.v, n);
        let tol = (m as f64).sqrt() * f64::EPSILON;

        for _sweep in 0..MAX_SWEEPS {
            let mut rotations = 0usize;

            for p in 0..n {
                for q in (p + 1)..n {
                    let (a_pp, a_qq, a_pq) = compute_gram_elements(&self.b, m, n, p, q);
                    if a_pq.abs() <= tol * (a_pp * a_qq).sqrt() {
                        continue;
                    }

                    let rot = JacobiRotation::compute(a_pp, a_qq, a_pq);
                    apply_rotation_to_columns(&mut self.b, m, n, p, q, &rot);
                    apply_rotation_to_columns(&mut self.v, n, n, p, q, &rot);
                    rotations += 1;
                }
            }

            if rotations == 0 {
                break;
            }
        }

        for j in 0..n {
            self.norms[j] = (0..m)
                .map(|i| self.b[i * n + j] * self.b[i * n + j])
                .sum::<f64>()
                .sqrt();
        }
        argsort_desc_by(&mut self.order, &self.norms, |s| s);

        for (new_idx, &old_idx) in self.order.iter().enumerate() {
            let sigma = self.norms[old_idx];
            s_out[new_idx] = sigma;
            let inv = if sigma > 0.0 { 1.0 / sigma } else { 0.0 };
            for i in 0..m {
                u_out[i * n + new_idx] = self.b[i * n + old_idx] * inv;
            }
            for j in 0..n {
                vt_out[new_idx * n + j] = self.v[j * n + old_idx];
            }
        }

        Ok(())
    }
}
