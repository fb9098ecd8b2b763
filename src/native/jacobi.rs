//! Jacobi rotation utilities shared by the symmetric eigensolver and the
//! one-sided SVD
//!
//! Rotation parameters use the LAPACK formula to avoid catastrophic
//! cancellation. All routines work on row-major slices in place.

/// Jacobi rotation parameters (cosine and sine of rotation angle).
///
/// These parameters define the rotation applied to columns `p` and `q`:
/// ```text
/// J = [ c   s ]
///     [ -s  c ]
/// ```
#[derive(Debug, Clone, Copy)]
pub struct JacobiRotation {
    /// Cosine of rotation angle
    pub c: f64,
    /// Sine of rotation angle
    pub s: f64,
}

impl JacobiRotation {
    /// Rotation that zeroes the off-diagonal of the symmetric 2×2 block
    /// `[[a_pp, a_pq], [a_pq, a_qq]]`.
    ///
    /// ```text
    /// τ = (a_qq - a_pp) / (2 * a_pq)
    /// t = sign(τ) / (|τ| + sqrt(1 + τ²))
    /// c = 1 / sqrt(1 + t²)
    /// s = t * c
    /// ```
    #[inline]
    pub fn compute(a_pp: f64, a_qq: f64, a_pq: f64) -> Self {
        let tau_den = 2.0 * a_pq;
        if tau_den.abs() < 1e-300 {
            return Self { c: 1.0, s: 0.0 };
        }

        let tau = (a_qq - a_pp) / tau_den;
        let t = if tau >= 0.0 {
            1.0 / (tau + (1.0 + tau * tau).sqrt())
        } else {
            -1.0 / (-tau + (1.0 + tau * tau).sqrt())
        };

        let c = 1.0 / (1.0 + t * t).sqrt();
        Self { c, s: t * c }
    }
}

/// `[col_p', col_q'] = [col_p, col_q] @ J` on a `rows × cols` matrix
#[inline]
pub fn apply_rotation_to_columns(
    data: &mut [f64],
    rows: usize,
    cols: usize,
    p: usize,
    q: usize,
    rot: &JacobiRotation,
) {
    let JacobiRotation { c, s } = *rot;
    for i in 0..rows {
        let idx_p = i * cols + p;
        let idx_q = i * cols + q;
        let val_p = data[idx_p];
        let val_q = data[idx_q];
        data[idx_p] = c * val_p - s * val_q;
        data[idx_q] = s * val_p + c * val_q;
    }
}

/// `A' = Jᵀ @ A @ J` on a symmetric `n × n` matrix, zeroing `A[p,q]`.
///
/// `a_pp`, `a_qq` and `a_pq` are the entries before the rotation.
#[inline]
#[allow(clippy::too_many_arguments)]
pub fn apply_two_sided_rotation(
    work: &mut [f64],
    n: usize,
    p: usize,
    q: usize,
    rot: &JacobiRotation,
    a_pp: f64,
    a_qq: f64,
    a_pq: f64,
) {
    let JacobiRotation { c, s } = *rot;

    for k in 0..n {
        if k != p && k != q {
            let a_kp = work[k * n + p];
            let a_kq = work[k * n + q];

            let new_kp = c * a_kp - s * a_kq;
            let new_kq = s * a_kp + c * a_kq;

            work[k * n + p] = new_kp;
            work[p * n + k] = new_kp;
            work[k * n + q] = new_kq;
            work[q * n + k] = new_kq;
        }
    }

    let cs2 = 2.0 * c * s;
    work[p * n + p] = c * c * a_pp - cs2 * a_pq + s * s * a_qq;
    work[q * n + q] = s * s * a_pp + cs2 * a_pq + c * c * a_qq;
    work[p * n + q] = 0.0;
    work[q * n + p] = 0.0;
}

/// Gram entries `(b_p·b_p, b_q·b_q, b_p·b_q)` for columns `p` and `q`
#[inline]
pub fn compute_gram_elements(
    b: &[f64],
    rows: usize,
    cols: usize,
    p: usize,
    q: usize,
) -> (f64, f64, f64) {
    let mut a_pp = 0.0;
    let mut a_qq = 0.0;
    let mut a_pq = 0.0;
    for i in 0..rows {
        let bp = b[i * cols + p];
        let bq = b[i * cols + q];
        a_pp += bp * bp;
        a_qq += bq * bq;
        a_pq += bp * bq;
    }
    (a_pp, a_qq, a_pq)
}

/// Reset `order` to `0..n` and sort it so `key(values[order[i]])` descends.
///
/// Uses an unstable sort so no scratch memory is allocated.
#[inline]
pub fn argsort_desc_by(order: &mut [usize], values: &[f64], key: impl Fn(f64) -> f64) {
    for (i, slot) in order.iter_mut().enumerate() {
        *slot = i;
    }
    order.sort_unstable_by(|&i, &j| {
        key(values[j])
            .partial_cmp(&key(values[i]))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Write the identity into an `n × n` buffer
#[inline]
pub fn fill_identity(data: &mut [f64], n: usize) {
    data.fill(0.0);
    for i in 0..n {
        data[i * n + i] = 1.0;
    }
}
