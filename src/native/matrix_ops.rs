//! Basic dense kernels: element-wise ops, matmul, transpose, norms, pseudoinverse

/// `c = a + b`
#[inline]
pub fn add_into(a: &[f64], b: &[f64], c: &mut [f64]) {
    for ((c, &a), &b) in c.iter_mut().zip(a).zip(b) {
        *c = a + b;
    }
}

/// `c = a - b`
#[inline]
pub fn sub_into(a: &[f64], b: &[f64], c: &mut [f64]) {
    for ((c, &a), &b) in c.iter_mut().zip(a).zip(b) {
        *c = a - b;
    }
}

/// `c = scalar * a`
#[inline]
pub fn scale_into(a: &[f64], scalar: f64, c: &mut [f64]) {
    for (c, &a) in c.iter_mut().zip(a) {
        *c = scalar * a;
    }
}

/// `c [m × n] = a [m × k] @ b [k × n]`, all row-major.
///
/// i-k-j loop order so the innermost loop streams rows of `b` and `c`.
pub fn matmul_into(a: &[f64], b: &[f64], c: &mut [f64], m: usize, k: usize, n: usize) {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), k * n);
    debug_assert_eq!(c.len(), m * n);

    c.fill(0.0);
    for i in 0..m {
        let c_row = &mut c[i * n..(i + 1) * n];
        for p in 0..k {
            let a_ip = a[i * k + p];
            if a_ip == 0.0 {
                continue;
            }
            let b_row = &b[p * n..(p + 1) * n];
            for (c_ij, &b_pj) in c_row.iter_mut().zip(b_row) {
                *c_ij += a_ip * b_pj;
            }
        }
    }
}

/// `out [n × m] = aᵀ` for `a [m × n]`
pub fn transpose_into(a: &[f64], out: &mut [f64], m: usize, n: usize) {
    for i in 0..m {
        for j in 0..n {
            out[j * m + i] = a[i * n + j];
        }
    }
}

/// Frobenius norm of a flattened matrix
#[inline]
pub fn frobenius_norm(data: &[f64]) -> f64 {
    data.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// `out [n × m] = V @ diag(1/S) @ Uᵀ` from the thin SVD `U [m × n]`, `S [n]`,
/// `Vᵗ [n × n]`.
///
/// Singular values at or below `max(m, n) · ε · S[0]` are treated as zero.
pub fn pseudoinverse_from_svd(
    u: &[f64],
    s: &[f64],
    vt: &[f64],
    out: &mut [f64],
    m: usize,
    n: usize,
) {
    debug_assert_eq!(out.len(), n * m);

    let cutoff = s.first().copied().unwrap_or(0.0) * m.max(n) as f64 * f64::EPSILON;
    out.fill(0.0);
    for (k, &sigma) in s.iter().enumerate() {
        if sigma <= cutoff {
            continue;
        }
        let inv = 1.0 / sigma;
        for j in 0..n {
            let v_jk = vt[k * n + j] * inv;
            if v_jk == 0.0 {
                continue;
            }
            let out_row = &mut out[j * m..(j + 1) * m];
            for (i, slot) in out_row.iter_mut().enumerate() {
                *slot += v_jk * u[i * n + k];
            }
        }
    }
}
