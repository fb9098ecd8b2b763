//! Library adapters and the registry that resolves them by name
//!
//! A [`LibraryAdapter`] binds the operation contracts to one matrix library's
//! native calls. Each `operation_*` method pays every one-time cost up front
//! (buffer allocation, workspace sizing, shape validation) and returns a
//! contract that only computes. An adapter that cannot perform an operation
//! returns [`Error::UnsupportedOperation`](crate::error::Error::UnsupportedOperation)
//! instead of a degraded result.
//!
//! The remaining methods (conversion, norm, chained multiply, subtract,
//! transpose) exist for verification and are never called on the timed path.

pub mod native;
#[cfg(feature = "nalgebra")]
pub mod nalgebra;
#[cfg(feature = "ndarray")]
pub mod ndarray;
mod registry;

pub use registry::{Library, LibraryRegistry};

use crate::error::{Error, Result};
use crate::matrix::{MatrixBuilder, MatrixHandle};
use crate::operation::{
    BoxedEvd, BoxedMutatingBinary, BoxedMutatingScalar, BoxedMutatingUnary, BoxedProducingBinary,
    BoxedProducingUnary, BoxedProperty, BoxedSolve, BoxedSvd,
};
use crate::reference::ReferenceMatrix;

/// Per-library factory of operation contracts.
pub trait LibraryAdapter: Clone + Send + Sync + 'static {
    /// The library's dense matrix type
    type Matrix: MatrixHandle;

    /// Registry key
    fn name(&self) -> &'static str;

    /// Builder for a zero `rows × cols` matrix
    fn builder(&self, rows: usize, cols: usize) -> MatrixBuilder<Self::Matrix> {
        MatrixBuilder::new(rows, cols)
    }

    /// `target = left + right`
    fn operation_add(&self) -> Result<BoxedMutatingBinary<Self::Matrix>>;

    /// `target = scalar · input`
    fn operation_scale(&self) -> Result<BoxedMutatingScalar<Self::Matrix>>;

    /// `left · right` into a fresh matrix
    fn operation_multiply_to_produce(&self) -> Result<BoxedProducingBinary<Self::Matrix>>;

    /// `target = left · right`; target must already be `left.rows × right.cols`
    fn operation_fill_by_multiplying(&self) -> Result<BoxedMutatingBinary<Self::Matrix>>;

    /// `body · X = rhs` for a `equations × variables` body and
    /// `equations × solutions` rhs. With `spd` set the adapter uses a solver
    /// for symmetric positive definite bodies.
    fn operation_equation_system_solver(
        &self,
        equations: usize,
        variables: usize,
        solutions: usize,
        spd: bool,
    ) -> Result<BoxedSolve<Self::Matrix>>;

    /// Eigenvectors of a symmetric `dim × dim` matrix
    fn operation_eigenvectors(&self, dim: usize) -> Result<BoxedMutatingUnary<Self::Matrix>>;

    /// `[D, V]` of a symmetric `dim × dim` matrix
    fn operation_evd(&self, dim: usize) -> Result<BoxedEvd<Self::Matrix>>;

    /// `[U, Σ, Vᵗ]` of a `dim × dim` matrix
    fn operation_svd(&self, dim: usize) -> Result<BoxedSvd<Self::Matrix>>;

    /// Moore-Penrose pseudoinverse of a `dim × dim` matrix
    fn operation_pseudoinverse(&self, dim: usize) -> Result<BoxedProducingUnary<Self::Matrix>>;

    /// Determinant of a `dim × dim` matrix
    fn operation_determinant(&self, dim: usize) -> Result<BoxedProperty<Self::Matrix>>;

    /// Copy into the interchange format. Exact for every finite value.
    fn to_reference(&self, matrix: &Self::Matrix) -> ReferenceMatrix {
        ReferenceMatrix::from_fn(matrix.rows(), matrix.cols(), |i, j| matrix.at(i, j))
    }

    /// Copy out of the interchange format. Exact for every finite value.
    fn from_reference(&self, reference: &ReferenceMatrix) -> Self::Matrix {
        let mut builder = self.builder(reference.rows(), reference.cols());
        for (i, row) in reference.as_rows().iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                builder.set(i, j, value);
            }
        }
        builder.build()
    }

    /// Overwrite `destination` with `source`; shapes must match
    fn copy(&self, source: &Self::Matrix, destination: &mut Self::Matrix) -> Result<()>;

    /// Frobenius norm
    fn norm(&self, matrix: &Self::Matrix) -> f64;

    /// Left-to-right product of one or more factors
    fn multiply(&self, factors: &[&Self::Matrix]) -> Result<Self::Matrix>;

    /// `left - right`
    fn subtract(&self, left: &Self::Matrix, right: &Self::Matrix) -> Result<Self::Matrix>;

    /// `matrixᵀ`
    fn transpose(&self, matrix: &Self::Matrix) -> Self::Matrix;
}

/// Split a factor list into its head and tail, rejecting an empty list
pub(crate) fn split_factors<'a, M>(factors: &'a [&'a M]) -> Result<(&'a M, &'a [&'a M])> {
    factors
        .split_first()
        .map(|(first, rest)| (*first, rest))
        .ok_or_else(|| Error::invalid_argument("factors", "at least one factor is required"))
}
