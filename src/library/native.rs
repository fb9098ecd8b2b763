//! Adapter over the in-crate row-major kernels
//!
//! Every decomposition contract owns its workspace, sized when the contract
//! is prepared, so `execute` performs no allocation except where the
//! contract itself is producing.

use super::{LibraryAdapter, split_factors};
use crate::error::{Error, Result};
use crate::matrix::{MatrixHandle, check_product, check_shape, check_square};
use crate::native::decompositions::{cholesky_in_place, determinant_in_place, lu_in_place};
use crate::native::matrix_ops::{
    add_into, frobenius_norm, matmul_into, pseudoinverse_from_svd, scale_into, sub_into,
    transpose_into,
};
use crate::native::solvers::{cholesky_solve_in_place, lu_solve_in_place};
use crate::native::{DenseMatrix, SvdWorkspace, SymmetricEigenWorkspace};
use crate::operation::{
    BoxedEvd, BoxedMutatingBinary, BoxedMutatingScalar, BoxedMutatingUnary, BoxedProducingBinary,
    BoxedProducingUnary, BoxedProperty, BoxedSolve, BoxedSvd, DecompositionOperation, EvdFactors,
    MutatingUnaryOperation, ProducingUnaryOperation, PropertyOperation, SolveOperation,
    SvdFactors,
};

/// Registry key of the native library
pub const NAME: &str = "native";

/// The in-crate dense kernels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLibrary;

impl LibraryAdapter for NativeLibrary {
    type Matrix = DenseMatrix;

    fn name(&self) -> &'static str {
        NAME
    }

    fn operation_add(&self) -> Result<BoxedMutatingBinary<DenseMatrix>> {
        Ok(Box::new(
            |left: &DenseMatrix, right: &DenseMatrix, target: &mut DenseMatrix| -> Result<()> {
                check_shape(right, left.shape())?;
                check_shape(target, left.shape())?;
                add_into(left.as_slice(), right.as_slice(), target.as_mut_slice());
                Ok(())
            },
        ))
    }

    fn operation_scale(&self) -> Result<BoxedMutatingScalar<DenseMatrix>> {
        Ok(Box::new(
            |input: &DenseMatrix, scalar: f64, target: &mut DenseMatrix| -> Result<()> {
                check_shape(target, input.shape())?;
                scale_into(input.as_slice(), scalar, target.as_mut_slice());
                Ok(())
            },
        ))
    }

    fn operation_multiply_to_produce(&self) -> Result<BoxedProducingBinary<DenseMatrix>> {
        Ok(Box::new(|left: &DenseMatrix, right: &DenseMatrix| -> Result<DenseMatrix> {
            let (m, n) = check_product(left, right)?;
            let mut product = DenseMatrix::zeros(m, n);
            matmul_into(
                left.as_slice(),
                right.as_slice(),
                product.as_mut_slice(),
                m,
                left.cols(),
                n,
            );
            Ok(product)
        }))
    }

    fn operation_fill_by_multiplying(&self) -> Result<BoxedMutatingBinary<DenseMatrix>> {
        Ok(Box::new(
            |left: &DenseMatrix, right: &DenseMatrix, target: &mut DenseMatrix| -> Result<()> {
                let (m, n) = check_product(left, right)?;
                check_shape(target, (m, n))?;
                matmul_into(
                    left.as_slice(),
                    right.as_slice(),
                    target.as_mut_slice(),
                    m,
                    left.cols(),
                    n,
                );
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
    ) -> Result<BoxedSolve<DenseMatrix>> {
        Ok(Box::new(NativeSolver::new(
            equations, variables, solutions, spd,
        )?))
    }

    fn operation_eigenvectors(&self, dim: usize) -> Result<BoxedMutatingUnary<DenseMatrix>> {
        Ok(Box::new(NativeEigenvectors {
            workspace: SymmetricEigenWorkspace::new(dim),
            values: vec![0.0; dim],
            vectors: DenseMatrix::zeros(dim, dim),
        }))
    }

    fn operation_evd(&self, dim: usize) -> Result<BoxedEvd<DenseMatrix>> {
        Ok(Box::new(NativeEvd {
            workspace: SymmetricEigenWorkspace::new(dim),
            values: vec![0.0; dim],
            factors: EvdFactors::zeros(dim),
        }))
    }

    fn operation_svd(&self, dim: usize) -> Result<BoxedSvd<DenseMatrix>> {
        Ok(Box::new(NativeSvd {
            workspace: SvdWorkspace::new(dim, dim)?,
            singular_values: vec![0.0; dim],
            factors: SvdFactors::zeros(dim),
        }))
    }

    fn operation_pseudoinverse(&self, dim: usize) -> Result<BoxedProducingUnary<DenseMatrix>> {
        Ok(Box::new(NativePseudoinverse {
            workspace: SvdWorkspace::new(dim, dim)?,
            u: vec![0.0; dim * dim],
            s: vec![0.0; dim],
            vt: vec![0.0; dim * dim],
        }))
    }

    fn operation_determinant(&self, dim: usize) -> Result<BoxedProperty<DenseMatrix>> {
        Ok(Box::new(NativeDeterminant {
            lu: vec![0.0; dim * dim],
            pivots: vec![0; dim],
        }))
    }

    fn copy(&self, source: &DenseMatrix, destination: &mut DenseMatrix) -> Result<()> {
        check_shape(destination, source.shape())?;
        destination.copy_from(source);
        Ok(())
    }

    fn norm(&self, matrix: &DenseMatrix) -> f64 {
        frobenius_norm(matrix.as_slice())
    }

    fn multiply(&self, factors: &[&DenseMatrix]) -> Result<DenseMatrix> {
        let (first, rest) = split_factors(factors)?;
        let mut acc = first.clone();
        for factor in rest {
            let (m, n) = check_product(&acc, factor)?;
            let mut next = DenseMatrix::zeros(m, n);
            matmul_into(
                acc.as_slice(),
                factor.as_slice(),
                next.as_mut_slice(),
                m,
                acc.cols(),
                n,
            );
            acc = next;
        }
        Ok(acc)
    }

    fn subtract(&self, left: &DenseMatrix, right: &DenseMatrix) -> Result<DenseMatrix> {
        check_shape(right, left.shape())?;
        let mut out = DenseMatrix::zeros(left.rows(), left.cols());
        sub_into(left.as_slice(), right.as_slice(), out.as_mut_slice());
        Ok(out)
    }

    fn transpose(&self, matrix: &DenseMatrix) -> DenseMatrix {
        let (m, n) = matrix.shape();
        let mut out = DenseMatrix::zeros(n, m);
        transpose_into(matrix.as_slice(), out.as_mut_slice(), m, n);
        out
    }
}

/// Square solver: Cholesky for SPD bodies, partial-pivot LU otherwise.
struct NativeSolver {
    spd: bool,
    equations: usize,
    solutions: usize,
    factors: Vec<f64>,
    pivots: Vec<usize>,
    solution: DenseMatrix,
}

impl NativeSolver {
    fn new(equations: usize, variables: usize, solutions: usize, spd: bool) -> Result<Self> {
        if equations != variables {
            return Err(Error::invalid_argument(
                "variables",
                format!("native solver handles square systems only, got {equations}x{variables}"),
            ));
        }
        Ok(Self {
            spd,
            equations,
            solutions,
            factors: vec![0.0; equations * equations],
            pivots: vec![0; equations],
            solution: DenseMatrix::zeros(variables, solutions),
        })
    }
}

impl SolveOperation<DenseMatrix> for NativeSolver {
    fn execute(&mut self, body: &DenseMatrix, rhs: &DenseMatrix) -> Result<&DenseMatrix> {
        let n = self.equations;
        check_shape(body, (n, n))?;
        check_shape(rhs, (n, self.solutions))?;

        self.factors.copy_from_slice(body.as_slice());
        self.solution.copy_from(rhs);
        if self.spd {
            cholesky_in_place(&mut self.factors, n)?;
            cholesky_solve_in_place(&self.factors, n, self.solution.as_mut_slice(), self.solutions);
        } else {
            lu_in_place(&mut self.factors, n, &mut self.pivots)?;
            lu_solve_in_place(
                &self.factors,
                n,
                &self.pivots,
                self.solution.as_mut_slice(),
                self.solutions,
            );
        }
        Ok(&self.solution)
    }
}

struct NativeEigenvectors {
    workspace: SymmetricEigenWorkspace,
    values: Vec<f64>,
    vectors: DenseMatrix,
}

impl MutatingUnaryOperation<DenseMatrix> for NativeEigenvectors {
    fn execute(&mut self, input: &DenseMatrix) -> Result<&DenseMatrix> {
        let n = self.workspace.order();
        check_shape(input, (n, n))?;
        self.workspace.decompose(
            input.as_slice(),
            &mut self.values,
            self.vectors.as_mut_slice(),
        )?;
        Ok(&self.vectors)
    }
}

struct NativeEvd {
    workspace: SymmetricEigenWorkspace,
    values: Vec<f64>,
    factors: EvdFactors<DenseMatrix>,
}

impl DecompositionOperation<DenseMatrix, EvdFactors<DenseMatrix>> for NativeEvd {
    fn execute(&mut self, input: &DenseMatrix) -> Result<&EvdFactors<DenseMatrix>> {
        let n = self.workspace.order();
        check_shape(input, (n, n))?;
        self.workspace.decompose(
            input.as_slice(),
            &mut self.values,
            self.factors.vectors.as_mut_slice(),
        )?;
        // Off-diagonal entries of D are never written, so they stay zero
        for (i, &value) in self.values.iter().enumerate() {
            self.factors.values[(i, i)] = value;
        }
        Ok(&self.factors)
    }
}

struct NativeSvd {
    workspace: SvdWorkspace,
    singular_values: Vec<f64>,
    factors: SvdFactors<DenseMatrix>,
}

impl DecompositionOperation<DenseMatrix, SvdFactors<DenseMatrix>> for NativeSvd {
    fn execute(&mut self, input: &DenseMatrix) -> Result<&SvdFactors<DenseMatrix>> {
        check_shape(input, self.workspace.shape())?;
        self.workspace.decompose(
            input.as_slice(),
            self.factors.left.as_mut_slice(),
            &mut self.singular_values,
            self.factors.right.as_mut_slice(),
        )?;
        for (i, &sigma) in self.singular_values.iter().enumerate() {
            self.factors.middle[(i, i)] = sigma;
        }
        Ok(&self.factors)
    }
}

/// Pseudoinverse through the SVD; the output is allocated per call.
struct NativePseudoinverse {
    workspace: SvdWorkspace,
    u: Vec<f64>,
    s: Vec<f64>,
    vt: Vec<f64>,
}

impl ProducingUnaryOperation<DenseMatrix> for NativePseudoinverse {
    fn execute(&mut self, input: &DenseMatrix) -> Result<DenseMatrix> {
        let (m, n) = self.workspace.shape();
        check_shape(input, (m, n))?;
        self.workspace
            .decompose(input.as_slice(), &mut self.u, &mut self.s, &mut self.vt)?;
        let mut out = DenseMatrix::zeros(n, m);
        pseudoinverse_from_svd(&self.u, &self.s, &self.vt, out.as_mut_slice(), m, n);
        Ok(out)
    }
}

struct NativeDeterminant {
    lu: Vec<f64>,
    pivots: Vec<usize>,
}

impl PropertyOperation<DenseMatrix> for NativeDeterminant {
    fn execute(&mut self, input: &DenseMatrix) -> Result<f64> {
        let n = check_square(input)?;
        check_shape(input, (self.pivots.len(), self.pivots.len()))?;
        self.lu.copy_from_slice(input.as_slice());
        Ok(determinant_in_place(&mut self.lu, n, &mut self.pivots))
    }
}
