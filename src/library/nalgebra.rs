//! Adapter over nalgebra's column-major `DMatrix<f64>`

use super::{LibraryAdapter, split_factors};
use crate::error::{Error, Result};
use crate::matrix::{MatrixHandle, check_product, check_shape, check_square};
use crate::operation::{
    BoxedEvd, BoxedMutatingBinary, BoxedMutatingScalar, BoxedMutatingUnary, BoxedProducingBinary,
    BoxedProducingUnary, BoxedProperty, BoxedSolve, BoxedSvd, DecompositionOperation, EvdFactors,
    MutatingUnaryOperation, SolveOperation, SvdFactors,
};
use crate::reference::ReferenceMatrix;
use nalgebra::{DMatrix, SVD, SymmetricEigen};

/// Registry key of the nalgebra library
pub const NAME: &str = "nalgebra";

impl MatrixHandle for DMatrix<f64> {
    fn zeros(rows: usize, cols: usize) -> Self {
        DMatrix::zeros(rows, cols)
    }

    fn rows(&self) -> usize {
        self.nrows()
    }

    fn cols(&self) -> usize {
        self.ncols()
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> f64 {
        self[(row, col)]
    }

    #[inline]
    fn set_at(&mut self, row: usize, col: usize, value: f64) {
        self[(row, col)] = value;
    }
}

/// nalgebra's dense linear algebra.
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraLibrary;

impl LibraryAdapter for NalgebraLibrary {
    type Matrix = DMatrix<f64>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn operation_add(&self) -> Result<BoxedMutatingBinary<DMatrix<f64>>> {
        Ok(Box::new(
            |left: &DMatrix<f64>, right: &DMatrix<f64>, target: &mut DMatrix<f64>| -> Result<()> {
                check_shape(right, left.shape())?;
                check_shape(target, left.shape())?;
                left.add_to(right, target);
                Ok(())
            },
        ))
    }

    fn operation_scale(&self) -> Result<BoxedMutatingScalar<DMatrix<f64>>> {
        Ok(Box::new(
            |input: &DMatrix<f64>, scalar: f64, target: &mut DMatrix<f64>| -> Result<()> {
                check_shape(target, input.shape())?;
                target.copy_from(input);
                *target *= scalar;
                Ok(())
            },
        ))
    }

    fn operation_multiply_to_produce(&self) -> Result<BoxedProducingBinary<DMatrix<f64>>> {
        Ok(Box::new(
            |left: &DMatrix<f64>, right: &DMatrix<f64>| -> Result<DMatrix<f64>> {
                check_product(left, right)?;
                Ok(left * right)
            },
        ))
    }

    fn operation_fill_by_multiplying(&self) -> Result<BoxedMutatingBinary<DMatrix<f64>>> {
        Ok(Box::new(
            |left: &DMatrix<f64>, right: &DMatrix<f64>, target: &mut DMatrix<f64>| -> Result<()> {
                let shape = check_product(left, right)?;
                check_shape(target, shape)?;
                // beta = 0: the previous contents of target are not read
                target.gemm(1.0, left, right, 0.0);
                Ok(())
            },
        ))
    }

    fn operation_equation_system_solver(
        &self,
        equations: usize,
        variables: usize,
        solutions: usize,
        spd: bool,
    ) -> Result<BoxedSolve<DMatrix<f64>>> {
        if equations != variables {
            return Err(Error::invalid_argument(
                "variables",
                format!("nalgebra solver handles square systems only, got {equations}x{variables}"),
            ));
        }
        Ok(Box::new(NalgebraSolver {
            spd,
            solution: DMatrix::zeros(variables, solutions),
        }))
    }

    fn operation_eigenvectors(&self, dim: usize) -> Result<BoxedMutatingUnary<DMatrix<f64>>> {
        Ok(Box::new(NalgebraEigenvectors {
            vectors: DMatrix::zeros(dim, dim),
        }))
    }

    fn operation_evd(&self, dim: usize) -> Result<BoxedEvd<DMatrix<f64>>> {
        Ok(Box::new(NalgebraEvd {
            factors: EvdFactors::zeros(dim),
        }))
    }

    fn operation_svd(&self, dim: usize) -> Result<BoxedSvd<DMatrix<f64>>> {
        Ok(Box::new(NalgebraSvd {
            factors: SvdFactors::zeros(dim),
        }))
    }

    fn operation_pseudoinverse(&self, dim: usize) -> Result<BoxedProducingUnary<DMatrix<f64>>> {
        Ok(Box::new(move |input: &DMatrix<f64>| -> Result<DMatrix<f64>> {
            check_shape(input, (dim, dim))?;
            // Same relative cutoff as the native kernel; ‖A‖_F bounds σ_max
            let eps = input.norm() * dim as f64 * f64::EPSILON;
            input
                .clone()
                .pseudo_inverse(eps)
                .map_err(|reason| Error::numerical("pseudoinverse", reason))
        }))
    }

    fn operation_determinant(&self, dim: usize) -> Result<BoxedProperty<DMatrix<f64>>> {
        Ok(Box::new(move |input: &DMatrix<f64>| -> Result<f64> {
            check_square(input)?;
            check_shape(input, (dim, dim))?;
            Ok(input.determinant())
        }))
    }

    fn from_reference(&self, reference: &ReferenceMatrix) -> DMatrix<f64> {
        DMatrix::from_fn(reference.rows(), reference.cols(), |i, j| {
            reference.get(i, j)
        })
    }

    fn copy(&self, source: &DMatrix<f64>, destination: &mut DMatrix<f64>) -> Result<()> {
        check_shape(destination, source.shape())?;
        destination.copy_from(source);
        Ok(())
    }

    fn norm(&self, matrix: &DMatrix<f64>) -> f64 {
        matrix.norm()
    }

    fn multiply(&self, factors: &[&DMatrix<f64>]) -> Result<DMatrix<f64>> {
        let (first, rest) = split_factors(factors)?;
        let mut acc = first.clone();
        for &factor in rest {
            check_product(&acc, factor)?;
            acc = &acc * factor;
        }
        Ok(acc)
    }

    fn subtract(&self, left: &DMatrix<f64>, right: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        check_shape(right, left.shape())?;
        Ok(left - right)
    }

    fn transpose(&self, matrix: &DMatrix<f64>) -> DMatrix<f64> {
        matrix.transpose()
    }
}

/// nalgebra's decompositions consume their input, so each call pays one
/// copy of the body. The solution buffer is retained.
struct NalgebraSolver {
    spd: bool,
    solution: DMatrix<f64>,
}

impl SolveOperation<DMatrix<f64>> for NalgebraSolver {
    fn execute(&mut self, body: &DMatrix<f64>, rhs: &DMatrix<f64>) -> Result<&DMatrix<f64>> {
        let (variables, solutions) = self.solution.shape();
        check_shape(body, (variables, variables))?;
        check_shape(rhs, (variables, solutions))?;

        self.solution.copy_from(rhs);
        if self.spd {
            let cholesky = body.clone().cholesky().ok_or_else(|| {
                Error::numerical("Cholesky decomposition", "matrix is not positive definite")
            })?;
            cholesky.solve_mut(&mut self.solution);
        } else if !body.clone().lu().solve_mut(&mut self.solution) {
            return Err(Error::numerical("LU decomposition", "matrix is singular"));
        }
        Ok(&self.solution)
    }
}

fn symmetric_eigen(input: &DMatrix<f64>) -> Result<SymmetricEigen<f64, nalgebra::Dyn>> {
    SymmetricEigen::try_new(input.clone(), f64::EPSILON, 0)
        .ok_or_else(|| Error::numerical("symmetric eigendecomposition", "did not converge"))
}

struct NalgebraEigenvectors {
    vectors: DMatrix<f64>,
}

impl MutatingUnaryOperation<DMatrix<f64>> for NalgebraEigenvectors {
    fn execute(&mut self, input: &DMatrix<f64>) -> Result<&DMatrix<f64>> {
        check_shape(input, self.vectors.shape())?;
        let eigen = symmetric_eigen(input)?;
        self.vectors.copy_from(&eigen.eigenvectors);
        Ok(&self.vectors)
    }
}

struct NalgebraEvd {
    factors: EvdFactors<DMatrix<f64>>,
}

impl DecompositionOperation<DMatrix<f64>, EvdFactors<DMatrix<f64>>> for NalgebraEvd {
    fn execute(&mut self, input: &DMatrix<f64>) -> Result<&EvdFactors<DMatrix<f64>>> {
        check_shape(input, self.factors.vectors.shape())?;
        let eigen = symmetric_eigen(input)?;
        self.factors.vectors.copy_from(&eigen.eigenvectors);
        self.factors.values.set_diagonal(&eigen.eigenvalues);
        Ok(&self.factors)
    }
}

struct NalgebraSvd {
    factors: SvdFactors<DMatrix<f64>>,
}

impl DecompositionOperation<DMatrix<f64>, SvdFactors<DMatrix<f64>>> for NalgebraSvd {
    fn execute(&mut self, input: &DMatrix<f64>) -> Result<&SvdFactors<DMatrix<f64>>> {
        check_shape(input, self.factors.middle.shape())?;
        let svd = SVD::try_new(input.clone(), true, true, f64::EPSILON, 0)
            .ok_or_else(|| Error::numerical("SVD", "did not converge"))?;
        let (Some(u), Some(v_t)) = (svd.u.as_ref(), svd.v_t.as_ref()) else {
            return Err(Error::numerical("SVD", "singular vectors were not computed"));
        };
        self.factors.left.copy_from(u);
        self.factors.middle.set_diagonal(&svd.singular_values);
        self.factors.right.copy_from(v_t);
        Ok(&self.factors)
    }
}
