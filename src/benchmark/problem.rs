//! Benchmark inputs, generated once per `(operation, dim, seed)`

use crate::error::{Error, Result};
use crate::operation::OperationKind;
use crate::reference::{EntryDistribution, RandomSource, ReferenceMatrix};
use std::f64::consts::PI;

/// Inputs for one benchmark case, held in the interchange format.
///
/// Generation depends only on the operation, the dimension, the seed and the
/// entry distribution, never on the library, so every adapter converts the
/// same bits.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    kind: OperationKind,
    dim: usize,
    seed: u64,
    operands: Vec<ReferenceMatrix>,
    scalar: f64,
    spd: bool,
}

impl Problem {
    /// Inputs with uniformly distributed entries
    pub fn generate(kind: OperationKind, dim: usize, seed: u64) -> Result<Self> {
        Self::generate_with(kind, dim, seed, EntryDistribution::Uniform)
    }

    /// Inputs with entries drawn from `distribution`.
    ///
    /// - binary operations and Scale: two general `dim × dim` matrices
    /// - Solve: an SPD `dim × dim` body and a `dim × 1` right-hand side
    /// - Eigenvectors, EigenDecomposition: one symmetric matrix
    /// - SVD, Pseudoinverse: one general matrix
    /// - Determinant: one general matrix scaled to keep `det` in range
    pub fn generate_with(
        kind: OperationKind,
        dim: usize,
        seed: u64,
        distribution: EntryDistribution,
    ) -> Result<Self> {
        if dim == 0 {
            return Err(Error::invalid_argument("dim", "must be at least 1"));
        }
        let mut source = RandomSource::new(dim, seed, distribution);
        let (operands, spd) = match kind {
            OperationKind::Add
            | OperationKind::Scale
            | OperationKind::MultiplyProduce
            | OperationKind::MultiplyMutate => {
                let left = source.general(dim, dim);
                let right = source.general(dim, dim);
                (vec![left, right], false)
            }
            OperationKind::Solve => {
                let body = source.spd(dim);
                let rhs = source.general(dim, 1);
                (vec![body, rhs], true)
            }
            OperationKind::Eigenvectors | OperationKind::EigenDecomposition => {
                (vec![source.symmetric(dim)], false)
            }
            OperationKind::Svd | OperationKind::Pseudoinverse => {
                (vec![source.general(dim, dim)], false)
            }
            OperationKind::Determinant => (vec![source.unit_determinant(dim)], false),
        };
        Ok(Self {
            kind,
            dim,
            seed,
            operands,
            scalar: PI,
            spd,
        })
    }

    /// Operation the inputs were generated for
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Problem dimension
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Generation seed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Matrix operands in call order: `[left, right]`, `[body, rhs]` or `[input]`
    pub fn operands(&self) -> &[ReferenceMatrix] {
        &self.operands
    }

    /// The scalar used by Scale
    pub fn scalar(&self) -> f64 {
        self.scalar
    }

    /// Whether the Solve body is symmetric positive definite
    pub fn is_spd(&self) -> bool {
        self.spd
    }
}
