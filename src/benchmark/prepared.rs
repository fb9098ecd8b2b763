//! Benchmark cases bound to one library, ready to execute
//!
//! [`prepare`] converts a [`Problem`] into library handles, asks the adapter
//! for the contract, allocates every target and returns the result behind the
//! object-safe [`PreparedOperation`]. Nothing in `execute` allocates beyond
//! what the contract itself does.
//!
//! Contracts that retain their output only expose it through `execute`, so
//! `verify` runs them once more, outside any timed region, and checks that
//! output. The contracts are deterministic, so it is the same output the
//! timed call produced.

use super::problem::Problem;
use super::verify::{Verification, VerificationPolicy};
use crate::error::Result;
use crate::library::LibraryAdapter;
use crate::matrix::MatrixHandle;
use crate::native::decompositions::determinant_in_place;
use crate::operation::{
    BoxedEvd, BoxedMutatingBinary, BoxedMutatingScalar, BoxedMutatingUnary, BoxedProducingBinary,
    BoxedProducingUnary, BoxedProperty, BoxedSolve, BoxedSvd, OperationKind,
};
use crate::reference::ReferenceMatrix;
use std::hint::black_box;
use tracing::debug;

/// A benchmark case with inputs converted, contract prepared and targets
/// allocated.
pub trait PreparedOperation: Send {
    /// Registry key of the library
    fn library(&self) -> &'static str;

    /// Operation being benchmarked
    fn kind(&self) -> OperationKind;

    /// Problem dimension
    fn dim(&self) -> usize;

    /// One timed invocation of the contract
    fn execute(&mut self) -> Result<()>;

    /// Residual check of the latest output; executes first if nothing ran yet
    fn verify(&mut self) -> Result<Verification>;

    /// Current inputs, converted back to the interchange format
    fn inputs(&self) -> Vec<ReferenceMatrix>;

    /// Latest outputs in the interchange format. A determinant is reported as
    /// a `1 × 1` matrix; decompositions report every factor.
    fn outputs(&mut self) -> Result<Vec<ReferenceMatrix>>;
}

/// Bind `problem` to `library`.
pub(crate) fn prepare<L: LibraryAdapter>(
    library: L,
    problem: &Problem,
    policy: VerificationPolicy,
) -> Result<Box<dyn PreparedOperation>> {
    let kind = problem.kind();
    let dim = problem.dim();
    debug!(library = library.name(), operation = %kind, dim, "preparing contract");

    let operands = problem.operands();
    let prepared: Box<dyn PreparedOperation> = match kind {
        OperationKind::Add => {
            let contract = library.operation_add()?;
            let expected = operands[0].add(&operands[1])?;
            let scale = expected.frobenius_norm();
            Box::new(TargetCase::new(
                Case::new(library, problem, policy),
                TargetContract::Binary(contract),
                expected,
                scale,
            ))
        }
        OperationKind::Scale => {
            let contract = library.operation_scale()?;
            let expected = operands[0].scale(problem.scalar());
            let scale = expected.frobenius_norm();
            Box::new(TargetCase::new(
                Case::new(library, problem, policy),
                TargetContract::Scalar(contract, problem.scalar()),
                expected,
                scale,
            ))
        }
        OperationKind::MultiplyMutate => {
            let contract = library.operation_fill_by_multiplying()?;
            let expected = operands[0].multiply(&operands[1])?;
            let scale = operands[0].frobenius_norm() * operands[1].frobenius_norm();
            Box::new(TargetCase::new(
                Case::new(library, problem, policy),
                TargetContract::Binary(contract),
                expected,
                scale,
            ))
        }
        OperationKind::MultiplyProduce => {
            let contract = library.operation_multiply_to_produce()?;
            let expected = operands[0].multiply(&operands[1])?;
            let scale = operands[0].frobenius_norm() * operands[1].frobenius_norm();
            Box::new(ProductCase {
                case: Case::new(library, problem, policy),
                contract,
                output: <L::Matrix as MatrixHandle>::zeros(dim, dim),
                executed: false,
                expected,
                scale,
            })
        }
        OperationKind::Solve => {
            let (equations, variables) = operands[0].shape();
            let contract = library.operation_equation_system_solver(
                equations,
                variables,
                operands[1].cols(),
                problem.is_spd(),
            )?;
            Box::new(SolveCase {
                case: Case::new(library, problem, policy),
                contract,
            })
        }
        OperationKind::Eigenvectors => {
            let contract = library.operation_eigenvectors(dim)?;
            Box::new(EigenvectorsCase {
                case: Case::new(library, problem, policy),
                contract,
            })
        }
        OperationKind::EigenDecomposition => {
            let contract = library.operation_evd(dim)?;
            Box::new(EvdCase {
                case: Case::new(library, problem, policy),
                contract,
            })
        }
        OperationKind::Svd => {
            let contract = library.operation_svd(dim)?;
            Box::new(SvdCase {
                case: Case::new(library, problem, policy),
                contract,
            })
        }
        OperationKind::Pseudoinverse => {
            let contract = library.operation_pseudoinverse(dim)?;
            Box::new(PseudoinverseCase {
                case: Case::new(library, problem, policy),
                contract,
                output: <L::Matrix as MatrixHandle>::zeros(dim, dim),
                executed: false,
            })
        }
        OperationKind::Determinant => {
            let contract = library.operation_determinant(dim)?;
            let mut lu = operands[0].to_dense();
            let mut pivots = vec![0; dim];
            let expected = determinant_in_place(lu.as_mut_slice(), dim, &mut pivots);
            Box::new(DeterminantCase {
                case: Case::new(library, problem, policy),
                contract,
                value: f64::NAN,
                executed: false,
                expected,
            })
        }
    };
    Ok(prepared)
}

/// Library, inputs and verification context shared by every case
struct Case<L: LibraryAdapter> {
    library: L,
    kind: OperationKind,
    dim: usize,
    policy: VerificationPolicy,
    originals: Vec<ReferenceMatrix>,
    inputs: Vec<L::Matrix>,
}

impl<L: LibraryAdapter> Case<L> {
    fn new(library: L, problem: &Problem, policy: VerificationPolicy) -> Self {
        let originals = problem.operands().to_vec();
        let inputs = originals
            .iter()
            .map(|reference| library.from_reference(reference))
            .collect();
        Self {
            library,
            kind: problem.kind(),
            dim: problem.dim(),
            policy,
            originals,
            inputs,
        }
    }

    fn inputs_intact(&self) -> bool {
        self.inputs
            .iter()
            .zip(&self.originals)
            .all(|(input, original)| self.library.to_reference(input).bit_identical(original))
    }

    /// An input modified by the contract fails verification outright
    fn assess(&self, residual: f64, scale: f64) -> Verification {
        let residual = if self.inputs_intact() {
            residual
        } else {
            f64::INFINITY
        };
        self.policy.assess(self.dim, residual, scale)
    }

    fn input_references(&self) -> Vec<ReferenceMatrix> {
        self.inputs
            .iter()
            .map(|input| self.library.to_reference(input))
            .collect()
    }

    /// `‖left − right‖`
    fn distance(&self, left: &L::Matrix, right: &L::Matrix) -> Result<f64> {
        Ok(self.library.norm(&self.library.subtract(left, right)?))
    }

    fn diagonal(&self, n: usize, entry: impl Fn(usize) -> f64) -> L::Matrix {
        let mut builder = self.library.builder(n, n);
        for i in 0..n {
            builder.set(i, i, entry(i));
        }
        builder.build()
    }
}

enum TargetContract<M> {
    Binary(BoxedMutatingBinary<M>),
    Scalar(BoxedMutatingScalar<M>, f64),
}

/// Add, Scale and fill-by-multiplying: the caller owns the target.
struct TargetCase<L: LibraryAdapter> {
    case: Case<L>,
    contract: TargetContract<L::Matrix>,
    target: L::Matrix,
    expected: ReferenceMatrix,
    scale: f64,
    executed: bool,
}

impl<L: LibraryAdapter> TargetCase<L> {
    fn new(
        case: Case<L>,
        contract: TargetContract<L::Matrix>,
        expected: ReferenceMatrix,
        scale: f64,
    ) -> Self {
        let (rows, cols) = expected.shape();
        Self {
            case,
            contract,
            target: <L::Matrix as MatrixHandle>::zeros(rows, cols),
            expected,
            scale,
            executed: false,
        }
    }
}

impl<L: LibraryAdapter> PreparedOperation for TargetCase<L> {
    fn library(&self) -> &'static str {
        self.case.library.name()
    }

    fn kind(&self) -> OperationKind {
        self.case.kind
    }

    fn dim(&self) -> usize {
        self.case.dim
    }

    fn execute(&mut self) -> Result<()> {
        let inputs = &self.case.inputs;
        match &mut self.contract {
            TargetContract::Binary(op) => op.execute(&inputs[0], &inputs[1], &mut self.target)?,
            TargetContract::Scalar(op, scalar) => {
                op.execute(&inputs[0], *scalar, &mut self.target)?
            }
        }
        black_box(&self.target);
        self.executed = true;
        Ok(())
    }

    fn verify(&mut self) -> Result<Verification> {
        if !self.executed {
            self.execute()?;
        }
        let output = self.case.library.to_reference(&self.target);
        let residual = output.sub(&self.expected)?.frobenius_norm();
        Ok(self.case.assess(residual, self.scale))
    }

    fn inputs(&self) -> Vec<ReferenceMatrix> {
        self.case.input_references()
    }

    fn outputs(&mut self) -> Result<Vec<ReferenceMatrix>> {
        if !self.executed {
            self.execute()?;
        }
        Ok(vec![self.case.library.to_reference(&self.target)])
    }
}

/// Multiply-to-produce: a fresh product per call.
struct ProductCase<L: LibraryAdapter> {
    case: Case<L>,
    contract: BoxedProducingBinary<L::Matrix>,
    output: L::Matrix,
    executed: bool,
    expected: ReferenceMatrix,
    scale: f64,
}

impl<L: LibraryAdapter> PreparedOperation for ProductCase<L> {
    fn library(&self) -> &'static str {
        self.case.library.name()
    }

    fn kind(&self) -> OperationKind {
        self.case.kind
    }

    fn dim(&self) -> usize {
        self.case.dim
    }

    fn execute(&mut self) -> Result<()> {
        let product = self
            .contract
            .execute(&self.case.inputs[0], &self.case.inputs[1])?;
        self.output = black_box(product);
        self.executed = true;
        Ok(())
    }

    fn verify(&mut self) -> Result<Verification> {
        if !self.executed {
            self.execute()?;
        }
        let output = self.case.library.to_reference(&self.output);
        let residual = output.sub(&self.expected)?.frobenius_norm();
        Ok(self.case.assess(residual, self.scale))
    }

    fn inputs(&self) -> Vec<ReferenceMatrix> {
        self.case.input_references()
    }

    fn outputs(&mut self) -> Result<Vec<ReferenceMatrix>> {
        if !self.executed {
            self.execute()?;
        }
        Ok(vec![self.case.library.to_reference(&self.output)])
    }
}

/// `A·X = B` with a retained solution buffer.
struct SolveCase<L: LibraryAdapter> {
    case: Case<L>,
    contract: BoxedSolve<L::Matrix>,
}

impl<L: LibraryAdapter> PreparedOperation for SolveCase<L> {
    fn library(&self) -> &'static str {
        self.case.library.name()
    }

    fn kind(&self) -> OperationKind {
        self.case.kind
    }

    fn dim(&self) -> usize {
        self.case.dim
    }

    fn execute(&mut self) -> Result<()> {
        let solution = self
            .contract
            .execute(&self.case.inputs[0], &self.case.inputs[1])?;
        black_box(solution);
        Ok(())
    }

    fn verify(&mut self) -> Result<Verification> {
        let case = &self.case;
        let (body, rhs) = (&case.inputs[0], &case.inputs[1]);
        let solution = self.contract.execute(body, rhs)?;

        let lib = &case.library;
        let product = lib.multiply(&[body, solution])?;
        let residual = case.distance(&product, rhs)?;
        let scale = lib.norm(body) * lib.norm(solution) + lib.norm(rhs);
        Ok(case.assess(residual, scale))
    }

    fn inputs(&self) -> Vec<ReferenceMatrix> {
        self.case.input_references()
    }

    fn outputs(&mut self) -> Result<Vec<ReferenceMatrix>> {
        let solution = self
            .contract
            .execute(&self.case.inputs[0], &self.case.inputs[1])?;
        Ok(vec![self.case.library.to_reference(solution)])
    }
}

/// Eigenvectors only; eigenvalues are recovered from the Rayleigh quotient.
struct EigenvectorsCase<L: LibraryAdapter> {
    case: Case<L>,
    contract: BoxedMutatingUnary<L::Matrix>,
}

impl<L: LibraryAdapter> PreparedOperation for EigenvectorsCase<L> {
    fn library(&self) -> &'static str {
        self.case.library.name()
    }

    fn kind(&self) -> OperationKind {
        self.case.kind
    }

    fn dim(&self) -> usize {
        self.case.dim
    }

    fn execute(&mut self) -> Result<()> {
        black_box(self.contract.execute(&self.case.inputs[0])?);
        Ok(())
    }

    fn verify(&mut self) -> Result<Verification> {
        let case = &self.case;
        let (lib, n) = (&case.library, case.dim);
        let a = &case.inputs[0];
        let v = self.contract.execute(a)?;

        // ‖A·V − V·diag(VᵗAV)‖ + ‖VᵗV − I‖·‖A‖
        let vt = lib.transpose(v);
        let rayleigh = lib.multiply(&[&vt, a, v])?;
        let d = case.diagonal(n, |i| rayleigh.at(i, i));
        let av = lib.multiply(&[a, v])?;
        let vd = lib.multiply(&[v, &d])?;
        let gram = lib.multiply(&[&vt, v])?;
        let identity = case.diagonal(n, |_| 1.0);

        let norm_a = lib.norm(a);
        let residual = case.distance(&av, &vd)? + case.distance(&gram, &identity)? * norm_a;
        Ok(case.assess(residual, norm_a))
    }

    fn inputs(&self) -> Vec<ReferenceMatrix> {
        self.case.input_references()
    }

    fn outputs(&mut self) -> Result<Vec<ReferenceMatrix>> {
        let vectors = self.contract.execute(&self.case.inputs[0])?;
        Ok(vec![self.case.library.to_reference(vectors)])
    }
}

/// `A = V·D·Vᵗ`
struct EvdCase<L: LibraryAdapter> {
    case: Case<L>,
    contract: BoxedEvd<L::Matrix>,
}

impl<L: LibraryAdapter> PreparedOperation for EvdCase<L> {
    fn library(&self) -> &'static str {
        self.case.library.name()
    }

    fn kind(&self) -> OperationKind {
        self.case.kind
    }

    fn dim(&self) -> usize {
        self.case.dim
    }

    fn execute(&mut self) -> Result<()> {
        black_box(self.contract.execute(&self.case.inputs[0])?);
        Ok(())
    }

    fn verify(&mut self) -> Result<Verification> {
        let case = &self.case;
        let lib = &case.library;
        let a = &case.inputs[0];
        let factors = self.contract.execute(a)?;

        let vt = lib.transpose(&factors.vectors);
        let rebuilt = lib.multiply(&[&factors.vectors, &factors.values, &vt])?;
        let residual = case.distance(a, &rebuilt)?;
        Ok(case.assess(residual, lib.norm(a)))
    }

    fn inputs(&self) -> Vec<ReferenceMatrix> {
        self.case.input_references()
    }

    fn outputs(&mut self) -> Result<Vec<ReferenceMatrix>> {
        let factors = self.contract.execute(&self.case.inputs[0])?;
        let lib = &self.case.library;
        Ok(vec![
            lib.to_reference(&factors.values),
            lib.to_reference(&factors.vectors),
        ])
    }
}

/// `A = U·Σ·Vᵗ`
struct SvdCase<L: LibraryAdapter> {
    case: Case<L>,
    contract: BoxedSvd<L::Matrix>,
}

impl<L: LibraryAdapter> PreparedOperation for SvdCase<L> {
    fn library(&self) -> &'static str {
        self.case.library.name()
    }

    fn kind(&self) -> OperationKind {
        self.case.kind
    }

    fn dim(&self) -> usize {
        self.case.dim
    }

    fn execute(&mut self) -> Result<()> {
        black_box(self.contract.execute(&self.case.inputs[0])?);
        Ok(())
    }

    fn verify(&mut self) -> Result<Verification> {
        let case = &self.case;
        let lib = &case.library;
        let a = &case.inputs[0];
        let factors = self.contract.execute(a)?;

        let rebuilt = lib.multiply(&[&factors.left, &factors.middle, &factors.right])?;
        let residual = case.distance(a, &rebuilt)?;
        Ok(case.assess(residual, lib.norm(a)))
    }

    fn inputs(&self) -> Vec<ReferenceMatrix> {
        self.case.input_references()
    }

    fn outputs(&mut self) -> Result<Vec<ReferenceMatrix>> {
        let factors = self.contract.execute(&self.case.inputs[0])?;
        let lib = &self.case.library;
        Ok(vec![
            lib.to_reference(&factors.left),
            lib.to_reference(&factors.middle),
            lib.to_reference(&factors.right),
        ])
    }
}

/// `A⁺`, a fresh matrix per call.
struct PseudoinverseCase<L: LibraryAdapter> {
    case: Case<L>,
    contract: BoxedProducingUnary<L::Matrix>,
    output: L::Matrix,
    executed: bool,
}

impl<L: LibraryAdapter> PreparedOperation for PseudoinverseCase<L> {
    fn library(&self) -> &'static str {
        self.case.library.name()
    }

    fn kind(&self) -> OperationKind {
        self.case.kind
    }

    fn dim(&self) -> usize {
        self.case.dim
    }

    fn execute(&mut self) -> Result<()> {
        let inverse = self.contract.execute(&self.case.inputs[0])?;
        self.output = black_box(inverse);
        self.executed = true;
        Ok(())
    }

    fn verify(&mut self) -> Result<Verification> {
        if !self.executed {
            self.execute()?;
        }
        let case = &self.case;
        let lib = &case.library;
        let (a, pinv) = (&case.inputs[0], &self.output);

        // ‖A·A⁺·A − A‖ relative to ‖A‖·κ, κ = ‖A‖·‖A⁺‖
        let rebuilt = lib.multiply(&[a, pinv, a])?;
        let residual = case.distance(&rebuilt, a)?;
        let norm_a = lib.norm(a);
        Ok(case.assess(residual, norm_a * norm_a * lib.norm(pinv)))
    }

    fn inputs(&self) -> Vec<ReferenceMatrix> {
        self.case.input_references()
    }

    fn outputs(&mut self) -> Result<Vec<ReferenceMatrix>> {
        if !self.executed {
            self.execute()?;
        }
        Ok(vec![self.case.library.to_reference(&self.output)])
    }
}

/// Determinant, checked against the native LU determinant of the same input.
struct DeterminantCase<L: LibraryAdapter> {
    case: Case<L>,
    contract: BoxedProperty<L::Matrix>,
    value: f64,
    executed: bool,
    expected: f64,
}

impl<L: LibraryAdapter> PreparedOperation for DeterminantCase<L> {
    fn library(&self) -> &'static str {
        self.case.library.name()
    }

    fn kind(&self) -> OperationKind {
        self.case.kind
    }

    fn dim(&self) -> usize {
        self.case.dim
    }

    fn execute(&mut self) -> Result<()> {
        self.value = black_box(self.contract.execute(&self.case.inputs[0])?);
        self.executed = true;
        Ok(())
    }

    fn verify(&mut self) -> Result<Verification> {
        if !self.executed {
            self.execute()?;
        }
        let (value, expected) = (self.value, self.expected);
        // Equal infinities agree; an infinity against a finite value never does
        let (residual, scale) = if value == expected {
            (0.0, 0.0)
        } else if expected.is_finite() {
            ((value - expected).abs(), expected.abs() * self.case.dim as f64)
        } else {
            (f64::INFINITY, 0.0)
        };
        Ok(self.case.assess(residual, scale))
    }

    fn inputs(&self) -> Vec<ReferenceMatrix> {
        self.case.input_references()
    }

    fn outputs(&mut self) -> Result<Vec<ReferenceMatrix>> {
        if !self.executed {
            self.execute()?;
        }
        let value = self.value;
        Ok(vec![ReferenceMatrix::from_fn(1, 1, |_, _| value)])
    }
}
