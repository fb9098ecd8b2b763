//! Library-agnostic view of a dense `f64` matrix and the builder used to fill one

use crate::error::{Error, Result};

/// An opaque, library-owned dense matrix of `f64`.
///
/// Implemented for every matrix type an adapter benchmarks. The shape of a
/// handle never changes after construction.
pub trait MatrixHandle: Clone + Send + Sync + 'static {
    /// Zero-filled `rows × cols` matrix
    fn zeros(rows: usize, cols: usize) -> Self;

    /// Number of rows
    fn rows(&self) -> usize;

    /// Number of columns
    fn cols(&self) -> usize;

    /// Entry at `(row, col)`
    fn at(&self, row: usize, col: usize) -> f64;

    /// Overwrite the entry at `(row, col)`
    fn set_at(&mut self, row: usize, col: usize, value: f64);

    /// `(rows, cols)`
    fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }
}

/// Fails with a shape mismatch unless `matrix` is exactly `expected`
pub fn check_shape<M: MatrixHandle>(matrix: &M, expected: (usize, usize)) -> Result<()> {
    if matrix.shape() != expected {
        return Err(Error::shape_mismatch(expected, matrix.shape()));
    }
    Ok(())
}

/// Fails with a shape mismatch unless `matrix` is square, returning its order
pub fn check_square<M: MatrixHandle>(matrix: &M) -> Result<usize> {
    let (m, n) = matrix.shape();
    if m != n {
        return Err(Error::shape_mismatch((m, m), (m, n)));
    }
    Ok(n)
}

/// Fails with a shape mismatch unless `left · right` is defined, returning
/// the product shape
pub fn check_product<M: MatrixHandle>(left: &M, right: &M) -> Result<(usize, usize)> {
    if left.cols() != right.rows() {
        return Err(Error::shape_mismatch(
            (left.cols(), right.cols()),
            right.shape(),
        ));
    }
    Ok((left.rows(), right.cols()))
}

/// Builds a matrix handle entry by entry.
///
/// `get` always returns the handle owned by this builder, not a copy.
///
/// # Panics
///
/// `set` panics when `row` or `col` is out of range.
#[derive(Debug, Clone)]
pub struct MatrixBuilder<M> {
    matrix: M,
}

impl<M: MatrixHandle> MatrixBuilder<M> {
    /// Start from a zero `rows × cols` matrix
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            matrix: M::zeros(rows, cols),
        }
    }

    /// Set one entry
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> &mut Self {
        let (rows, cols) = self.matrix.shape();
        assert!(
            row < rows && col < cols,
            "entry ({row}, {col}) out of range for {rows}x{cols} matrix"
        );
        self.matrix.set_at(row, col, value);
        self
    }

    /// The matrix being built
    pub fn get(&self) -> &M {
        &self.matrix
    }

    /// Finish building and take ownership of the matrix
    pub fn build(self) -> M {
        self.matrix
    }
}
