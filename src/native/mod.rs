//! In-crate dense linear algebra
//!
//! Plain row-major `f64` kernels that work on caller-provided buffers, so an
//! operation prepared once can run repeatedly without allocating. The `native`
//! library adapter is built on these, and verification uses them to compute
//! library-independent reference results.

pub mod decompositions;
pub mod eig_symmetric;
pub mod jacobi;
mod matrix;
pub mod matrix_ops;
pub mod solvers;
pub mod svd;

pub use eig_symmetric::SymmetricEigenWorkspace;
pub use matrix::DenseMatrix;
pub use svd::SvdWorkspace;
