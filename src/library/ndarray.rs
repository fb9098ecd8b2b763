//! Adapter over ndarray's `Array2<f64>`
//!
//! ndarray ships no decompositions of its own, so everything past
//! element-wise arithmetic and multiplication is declined.

use super::{LibraryAdapter, split_factors};
use crate::error::{Error, Result};
use crate::matrix::{MatrixHandle, check_product, check_shape};
use crate::operation::{
    BoxedEvd, BoxedMutatingBinary, BoxedMutatingScalar, BoxedMutatingUnary, BoxedProducingBinary,
    BoxedProducingUnary, BoxedProperty, BoxedSolve, BoxedSvd, OperationKind,
};
use ndarray::linalg::general_mat_mul;
use ndarray::{Array2, Zip};

/// Registry key of the ndarray library
pub const NAME: &str = "ndarray";

impl MatrixHandle for Array2<f64> {
    fn zeros(rows: usize, cols: usize) -> Self {
        Array2::zeros((rows, cols))
    }

    fn rows(&self) -> usize {
        self.nrows()
    }

    fn cols(&self) -> usize {
        self.ncols()
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> f64 {
        self[[row, col]]
    }

    #[inline]
    fn set_at(&mut self, row: usize, col: usize, value: f64) {
        self[[row, col]] = value;
    }
}

/// ndarray with its built-in (matrixmultiply backed) products.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdarrayLibrary;

impl LibraryAdapter for NdarrayLibrary {
    type Matrix = Array2<f64>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn operation_add(&self) -> Result<BoxedMutatingBinary<Array2<f64>>> {
        Ok(Box::new(
            |left: &Array2<f64>, right: &Array2<f64>, target: &mut Array2<f64>| -> Result<()> {
                check_shape(right, MatrixHandle::shape(left))?;
                check_shape(target, MatrixHandle::shape(left))?;
                Zip::from(target)
                    .and(left)
                    .and(right)
                    .for_each(|t, &l, &r| *t = l + r);
                Ok(())
            },
        ))
    }

    fn operation_scale(&self) -> Result<BoxedMutatingScalar<Array2<f64>>> {
        Ok(Box::new(
            |input: &Array2<f64>, scalar: f64, target: &mut Array2<f64>| -> Result<()> {
                check_shape(target, MatrixHandle::shape(input))?;
                Zip::from(target)
                    .and(input)
                    .for_each(|t, &x| *t = scalar * x);
                Ok(())
            },
        ))
    }

    fn operation_multiply_to_produce(&self) -> Result<BoxedProducingBinary<Array2<f64>>> {
        Ok(Box::new(
            |left: &Array2<f64>, right: &Array2<f64>| -> Result<Array2<f64>> {
                check_product(left, right)?;
                Ok(left.dot(right))
            },
        ))
    }

    fn operation_fill_by_multiplying(&self) -> Result<BoxedMutatingBinary<Array2<f64>>> {
        Ok(Box::new(
            |left: &Array2<f64>, right: &Array2<f64>, target: &mut Array2<f64>| -> Result<()> {
                let shape = check_product(left, right)?;
                check_shape(target, shape)?;
                general_mat_mul(1.0, left, right, 0.0, target);
                Ok(())
            },
        ))
    }

    fn operation_equation_system_solver(
        &self,
        _equations: usize,
        _variables: usize,
        _solutions: usize,
        _spd: bool,
    ) -> Result<BoxedSolve<Array2<f64>>> {
        Err(Error::unsupported(NAME, OperationKind::Solve))
    }

    fn operation_eigenvectors(&self, _dim: usize) -> Result<BoxedMutatingUnary<Array2<f64>>> {
        Err(Error::unsupported(NAME, OperationKind::Eigenvectors))
    }

    fn operation_evd(&self, _dim: usize) -> Result<BoxedEvd<Array2<f64>>> {
        Err(Error::unsupported(NAME, OperationKind::EigenDecomposition))
    }

    fn operation_svd(&self, _dim: usize) -> Result<BoxedSvd<Array2<f64>>> {
        Err(Error::unsupported(NAME, OperationKind::Svd))
    }

    fn operation_pseudoinverse(&self, _dim: usize) -> Result<BoxedProducingUnary<Array2<f64>>> {
        Err(Error::unsupported(NAME, OperationKind::Pseudoinverse))
    }

    fn operation_determinant(&self, _dim: usize) -> Result<BoxedProperty<Array2<f64>>> {
        Err(Error::unsupported(NAME, OperationKind::Determinant))
    }

    fn copy(&self, source: &Array2<f64>, destination: &mut Array2<f64>) -> Result<()> {
        check_shape(destination, MatrixHandle::shape(source))?;
        destination.assign(source);
        Ok(())
    }

    fn norm(&self, matrix: &Array2<f64>) -> f64 {
        matrix.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    fn multiply(&self, factors: &[&Array2<f64>]) -> Result<Array2<f64>> {
        let (first, rest) = split_factors(factors)?;
        let mut acc = first.clone();
        for &factor in rest {
            check_product(&acc, factor)?;
            acc = acc.dot(factor);
        }
        Ok(acc)
    }

    fn subtract(&self, left: &Array2<f64>, right: &Array2<f64>) -> Result<Array2<f64>> {
        check_shape(right, MatrixHandle::shape(left))?;
        Ok(left - right)
    }

    fn transpose(&self, matrix: &Array2<f64>) -> Array2<f64> {
        matrix.t().to_owned()
    }
}
