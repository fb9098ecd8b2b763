//! # matbench
//!
//! **Micro-benchmark harness for dense `f64` matrix libraries.**
//!
//! matbench times the same logical operations (add, scale, multiply, solve,
//! eigendecomposition, SVD, pseudoinverse, determinant) across several Rust
//! matrix libraries. Every library is driven through one set of operation
//! contracts, fed bit-identical inputs, and has its outputs checked with
//! residual-based verification so a fast but wrong result is never reported
//! as a win.
//!
//! ## Lifecycle
//!
//! Each `(library, operation, dimension)` case is a [`BenchmarkOperation`]:
//! `configure → setup → execute* → verify → teardown`. Only `execute` is
//! meant to be timed; conversion, allocation and verification happen outside
//! it.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use matbench::prelude::*;
//!
//! let registry = LibraryRegistry::with_defaults();
//! let mut op = BenchmarkOperation::new(BenchmarkParams::new("nalgebra", OperationKind::Svd, 100));
//! op.setup(&registry)?;
//! op.execute()?;
//! op.verify()?;
//! op.teardown()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `nalgebra` (default): adapter over `nalgebra::DMatrix<f64>`
//! - `ndarray` (default): adapter over `ndarray::Array2<f64>`
//! - `rayon` (default): sweep libraries in parallel in [`suite::run_suite`]
//!
//! The `native` adapter over the in-crate kernels is always available.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod benchmark;
pub mod config;
pub mod error;
pub mod library;
pub mod matrix;
pub mod native;
pub mod operation;
pub mod reference;
pub mod suite;

pub use benchmark::{BenchmarkOperation, BenchmarkParams};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::benchmark::{
        BenchmarkOperation, BenchmarkParams, LifecycleState, Problem, Verification,
        VerificationPolicy,
    };
    pub use crate::config::SuiteConfig;
    pub use crate::error::{Error, Result};
    pub use crate::library::{Library, LibraryAdapter, LibraryRegistry};
    pub use crate::matrix::{MatrixBuilder, MatrixHandle};
    pub use crate::operation::{
        DecompositionOperation, EvdFactors, MutatingBinaryOperation, MutatingScalarOperation,
        MutatingUnaryOperation, OperationKind, ProducingBinaryOperation,
        ProducingUnaryOperation, PropertyOperation, SolveOperation, SvdFactors,
    };
    pub use crate::reference::{EntryDistribution, ReferenceMatrix};
    pub use crate::suite::{CaseOutcome, SuiteReport, run_suite};

    pub use crate::library::native::NativeLibrary;

    #[cfg(feature = "nalgebra")]
    pub use crate::library::nalgebra::NalgebraLibrary;

    #[cfg(feature = "ndarray")]
    pub use crate::library::ndarray::NdarrayLibrary;
}
