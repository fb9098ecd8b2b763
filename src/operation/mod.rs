//! Operation contracts every library adapter realizes
//!
//! The contracts are split by arity and by who owns the output:
//!
//! - *Producing* contracts return a freshly allocated matrix on every call.
//! - *Mutating* contracts overwrite a buffer: either one retained by the
//!   contract itself (unary, solve, decompositions) or a target supplied by
//!   the caller (binary, scalar).
//!
//! A contract instance is prepared once by its adapter. Any buffer it retains
//! is allocated at that point and only overwritten by `execute`, never
//! resized. Operand shapes are checked before any numerical work.
//!
//! Stateless contracts can be written as closures; the blanket impls below
//! cover them.

mod kind;

pub use kind::OperationKind;

use crate::error::Result;
use crate::matrix::MatrixHandle;

/// `(input) -> output`, output freshly allocated each call
pub trait ProducingUnaryOperation<M>: Send {
    /// Run the operation
    fn execute(&mut self, input: &M) -> Result<M>;
}

/// `(input) -> output`, output is a retained buffer overwritten each call
pub trait MutatingUnaryOperation<M>: Send {
    /// Run the operation, returning the retained output
    fn execute(&mut self, input: &M) -> Result<&M>;
}

/// `(left, right) -> output`, output freshly allocated each call
pub trait ProducingBinaryOperation<M>: Send {
    /// Run the operation
    fn execute(&mut self, left: &M, right: &M) -> Result<M>;
}

/// `(left, right, target)`, target supplied by the caller with the correct shape
pub trait MutatingBinaryOperation<M>: Send {
    /// Run the operation, overwriting `target`
    fn execute(&mut self, left: &M, right: &M, target: &mut M) -> Result<()>;
}

/// `(input, scalar, target)` with `target = scalar · input`
pub trait MutatingScalarOperation<M>: Send {
    /// Run the operation, overwriting `target`
    fn execute(&mut self, input: &M, scalar: f64, target: &mut M) -> Result<()>;
}

/// `(body, rhs) -> solution`, solution is a retained `(variables, solutions)` buffer
pub trait SolveOperation<M>: Send {
    /// Solve `body · X = rhs`, returning the retained solution
    fn execute(&mut self, body: &M, rhs: &M) -> Result<&M>;
}

/// `(input) -> factors`, a fixed-arity factor record re-populated each call
pub trait DecompositionOperation<M, F>: Send {
    /// Decompose `input`, returning the retained factors
    fn execute(&mut self, input: &M) -> Result<&F>;
}

/// `(input) -> scalar property` such as the determinant
pub trait PropertyOperation<M>: Send {
    /// Compute the property
    fn execute(&mut self, input: &M) -> Result<f64>;
}

impl<M, F> ProducingUnaryOperation<M> for F
where
    F: FnMut(&M) -> Result<M> + Send,
{
    fn execute(&mut self, input: &M) -> Result<M> {
        self(input)
    }
}

impl<M, F> ProducingBinaryOperation<M> for F
where
    F: FnMut(&M, &M) -> Result<M> + Send,
{
    fn execute(&mut self, left: &M, right: &M) -> Result<M> {
        self(left, right)
    }
}

impl<M, F> MutatingBinaryOperation<M> for F
where
    F: FnMut(&M, &M, &mut M) -> Result<()> + Send,
{
    fn execute(&mut self, left: &M, right: &M, target: &mut M) -> Result<()> {
        self(left, right, target)
    }
}

impl<M, F> MutatingScalarOperation<M> for F
where
    F: FnMut(&M, f64, &mut M) -> Result<()> + Send,
{
    fn execute(&mut self, input: &M, scalar: f64, target: &mut M) -> Result<()> {
        self(input, scalar, target)
    }
}

impl<M, F> PropertyOperation<M> for F
where
    F: FnMut(&M) -> Result<f64> + Send,
{
    fn execute(&mut self, input: &M) -> Result<f64> {
        self(input)
    }
}

/// Singular value decomposition result: `A = left · middle · right`
///
/// `middle` holds the singular values on its diagonal and `right` is already
/// transposed (Vᵗ), so reconstruction is a plain three-factor product.
#[derive(Debug, Clone, PartialEq)]
pub struct SvdFactors<M> {
    /// Left singular vectors U [m, k]
    pub left: M,
    /// Diagonal Σ [k, k], singular values in descending order
    pub middle: M,
    /// Right singular vectors transposed Vᵗ [k, n]
    pub right: M,
}

impl<M: MatrixHandle> SvdFactors<M> {
    /// Zeroed factors for a `dim × dim` input
    pub fn zeros(dim: usize) -> Self {
        Self {
            left: M::zeros(dim, dim),
            middle: M::zeros(dim, dim),
            right: M::zeros(dim, dim),
        }
    }
}

/// Symmetric eigendecomposition result: `A = vectors · values · vectorsᵗ`
#[derive(Debug, Clone, PartialEq)]
pub struct EvdFactors<M> {
    /// Eigenvalues as a diagonal matrix D [n, n]
    pub values: M,
    /// Eigenvectors as columns V [n, n]
    pub vectors: M,
}

impl<M: MatrixHandle> EvdFactors<M> {
    /// Zeroed factors for a `dim × dim` input
    pub fn zeros(dim: usize) -> Self {
        Self {
            values: M::zeros(dim, dim),
            vectors: M::zeros(dim, dim),
        }
    }
}

/// Boxed [`ProducingUnaryOperation`]
pub type BoxedProducingUnary<M> = Box<dyn ProducingUnaryOperation<M>>;
/// Boxed [`MutatingUnaryOperation`]
pub type BoxedMutatingUnary<M> = Box<dyn MutatingUnaryOperation<M>>;
/// Boxed [`ProducingBinaryOperation`]
pub type BoxedProducingBinary<M> = Box<dyn ProducingBinaryOperation<M>>;
/// Boxed [`MutatingBinaryOperation`]
pub type BoxedMutatingBinary<M> = Box<dyn MutatingBinaryOperation<M>>;
/// Boxed [`MutatingScalarOperation`]
pub type BoxedMutatingScalar<M> = Box<dyn MutatingScalarOperation<M>>;
/// Boxed [`SolveOperation`]
pub type BoxedSolve<M> = Box<dyn SolveOperation<M>>;
/// Boxed SVD [`DecompositionOperation`]
pub type BoxedSvd<M> = Box<dyn DecompositionOperation<M, SvdFactors<M>>>;
/// Boxed eigendecomposition [`DecompositionOperation`]
pub type BoxedEvd<M> = Box<dyn DecompositionOperation<M, EvdFactors<M>>>;
/// Boxed [`PropertyOperation`]
pub type BoxedProperty<M> = Box<dyn PropertyOperation<M>>;
