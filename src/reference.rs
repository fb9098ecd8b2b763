//! Library-independent row-major interchange matrix
//!
//! Every adapter converts to and from [`ReferenceMatrix`]. Benchmark inputs are
//! generated once in this form and converted into each library's own
//! representation, and verification computes its expected values on it.

use crate::error::{Error, Result};
use crate::matrix::MatrixHandle;
use crate::native::{DenseMatrix, matrix_ops};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use std::fmt;
use std::str::FromStr;

/// Row-major array-of-arrays of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceMatrix {
    cols: usize,
    rows: Vec<Vec<f64>>,
}

impl ReferenceMatrix {
    /// Wrap rows, which must all have the same length.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(Error::invalid_argument(
                "rows",
                format!("row {i} has {} entries, expected {cols}", row.len()),
            ));
        }
        Ok(Self { cols, rows })
    }

    /// Build from a function of `(row, col)`
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let rows = (0..rows)
            .map(|i| (0..cols).map(|j| f(i, j)).collect())
            .collect();
        Self { cols, rows }
    }

    /// Zero-filled `rows × cols` matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |_, _| 0.0)
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols)
    }

    /// Entry at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    /// Borrow the rows
    pub fn as_rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Whether both matrices hold exactly the same bits in every entry
    pub fn bit_identical(&self, other: &ReferenceMatrix) -> bool {
        self.shape() == other.shape()
            && self
                .rows
                .iter()
                .flatten()
                .zip(other.rows.iter().flatten())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }

    /// Copy into a native dense matrix
    pub fn to_dense(&self) -> DenseMatrix {
        let data = self.rows.iter().flatten().copied().collect();
        DenseMatrix::from_vec(self.rows(), self.cols, data)
    }

    /// Copy from a native dense matrix
    pub fn from_dense(m: &DenseMatrix) -> Self {
        Self::from_fn(m.rows(), m.cols(), |i, j| m.at(i, j))
    }

    /// Frobenius norm
    pub fn frobenius_norm(&self) -> f64 {
        matrix_ops::frobenius_norm(&self.rows.iter().flatten().copied().collect::<Vec<_>>())
    }

    /// `self + other`
    pub fn add(&self, other: &ReferenceMatrix) -> Result<ReferenceMatrix> {
        self.check_same_shape(other)?;
        Ok(Self::from_fn(self.rows(), self.cols, |i, j| {
            self.get(i, j) + other.get(i, j)
        }))
    }

    /// `self - other`
    pub fn sub(&self, other: &ReferenceMatrix) -> Result<ReferenceMatrix> {
        self.check_same_shape(other)?;
        Ok(Self::from_fn(self.rows(), self.cols, |i, j| {
            self.get(i, j) - other.get(i, j)
        }))
    }

    /// `scalar · self`
    pub fn scale(&self, scalar: f64) -> ReferenceMatrix {
        Self::from_fn(self.rows(), self.cols, |i, j| scalar * self.get(i, j))
    }

    /// `selfᵀ`
    pub fn transpose(&self) -> ReferenceMatrix {
        Self::from_fn(self.cols, self.rows(), |i, j| self.get(j, i))
    }

    /// `self · other`
    pub fn multiply(&self, other: &ReferenceMatrix) -> Result<ReferenceMatrix> {
        if self.cols != other.rows() {
            return Err(Error::shape_mismatch(
                (self.cols, other.cols),
                other.shape(),
            ));
        }
        let (m, k, n) = (self.rows(), self.cols, other.cols);
        let a = self.to_dense();
        let b = other.to_dense();
        let mut c = DenseMatrix::zeros(m, n);
        matrix_ops::matmul_into(a.as_slice(), b.as_slice(), c.as_mut_slice(), m, k, n);
        Ok(Self::from_dense(&c))
    }

    fn check_same_shape(&self, other: &ReferenceMatrix) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(self.shape(), other.shape()));
        }
        Ok(())
    }
}

impl fmt::Display for ReferenceMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:>12.5e}")).collect();
            writeln!(f, "[{}]", cells.join(", "))?;
        }
        Ok(())
    }
}

/// Distribution of randomly generated entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryDistribution {
    /// Uniform in `[-1, 1)`
    #[default]
    Uniform,
    /// Standard normal
    Normal,
}

impl EntryDistribution {
    /// Variance of a single entry
    pub fn variance(self) -> f64 {
        match self {
            Self::Uniform => 1.0 / 3.0,
            Self::Normal => 1.0,
        }
    }
}

impl FromStr for EntryDistribution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(Self::Uniform),
            "normal" | "gaussian" => Ok(Self::Normal),
            other => Err(Error::invalid_argument(
                "distribution",
                format!("unknown entry distribution '{other}'"),
            )),
        }
    }
}

/// Deterministic generator of random reference matrices.
///
/// The stream depends only on `(dim, seed)`, never on the library being
/// benchmarked, so every adapter receives bit-identical inputs.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
    distribution: EntryDistribution,
}

impl RandomSource {
    /// Source for a `(dim, seed)` configuration
    pub fn new(dim: usize, seed: u64, distribution: EntryDistribution) -> Self {
        let mixed = seed ^ (dim as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            rng: StdRng::seed_from_u64(mixed),
            distribution,
        }
    }

    fn sample(&mut self) -> f64 {
        match self.distribution {
            EntryDistribution::Uniform => self.rng.random_range(-1.0..1.0),
            EntryDistribution::Normal => StandardNormal.sample(&mut self.rng),
        }
    }

    /// General `rows × cols` matrix
    pub fn general(&mut self, rows: usize, cols: usize) -> ReferenceMatrix {
        ReferenceMatrix::from_fn(rows, cols, |_, _| self.sample())
    }

    /// General square matrix scaled so that `E[det²] = 1`.
    ///
    /// Unscaled entries drive `log|det|` past the `f64` range from a few
    /// hundred rows on; with variance `(dim!)^(-1/dim) ≈ e / dim` per entry the
    /// determinant stays finite and non-zero at any practical size.
    pub fn unit_determinant(&mut self, dim: usize) -> ReferenceMatrix {
        let factor = (std::f64::consts::E / (dim as f64 * self.distribution.variance())).sqrt();
        self.general(dim, dim).scale(factor)
    }

    /// Symmetric `(G + Gᵀ) / 2`
    pub fn symmetric(&mut self, dim: usize) -> ReferenceMatrix {
        let g = self.general(dim, dim);
        ReferenceMatrix::from_fn(dim, dim, |i, j| 0.5 * (g.get(i, j) + g.get(j, i)))
    }

    /// Symmetric positive definite `GᵀG + dim·I`
    pub fn spd(&mut self, dim: usize) -> ReferenceMatrix {
        let g = self.general(dim, dim).to_dense();
        let mut gram = DenseMatrix::zeros(dim, dim);
        for i in 0..dim {
            for j in 0..=i {
                let dot: f64 = (0..dim).map(|k| g.at(k, i) * g.at(k, j)).sum();
                gram.set_at(i, j, dot);
                gram.set_at(j, i, dot);
            }
            let diag = gram.at(i, i) + dim as f64;
            gram.set_at(i, i, diag);
        }
        ReferenceMatrix::from_dense(&gram)
    }
}
