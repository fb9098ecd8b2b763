//! Error types for matbench

use crate::operation::OperationKind;
use thiserror::Error;

/// Result type alias using matbench's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing, executing or verifying a benchmark
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// No adapter is registered under the requested key
    #[error("Unknown library '{key}'")]
    UnknownLibrary {
        /// The key that was looked up
        key: String,
    },

    /// The adapter explicitly declines this operation
    #[error("{library} does not support {operation}")]
    UnsupportedOperation {
        /// Library key
        library: &'static str,
        /// The declined operation
        operation: OperationKind,
    },

    /// Invalid benchmark or contract argument
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Lifecycle method called in the wrong state
    #[error("Invalid state: expected {expected}, found {actual}")]
    InvalidState {
        /// State the call requires
        expected: &'static str,
        /// State the instance is in
        actual: &'static str,
    },

    /// Operand or target shape incompatible with the operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected (rows, cols)
        expected: (usize, usize),
        /// Actual (rows, cols)
        got: (usize, usize),
    },

    /// The numerical routine could not produce a result
    #[error("{operation} failed: {reason}")]
    Numerical {
        /// Routine that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },

    /// A verification residual exceeded its tolerance
    #[error(
        "Correctness violation for {library}/{operation} at dim {dim}: residual {residual:e} exceeds tolerance {tolerance:e}"
    )]
    CorrectnessViolation {
        /// Library key
        library: &'static str,
        /// Operation that was verified
        operation: OperationKind,
        /// Problem dimension
        dim: usize,
        /// Measured residual
        residual: f64,
        /// Allowed residual
        tolerance: f64,
    },

    /// Malformed suite configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: (usize, usize), got: (usize, usize)) -> Self {
        Self::ShapeMismatch { expected, got }
    }

    /// Create an unsupported operation error
    pub fn unsupported(library: &'static str, operation: OperationKind) -> Self {
        Self::UnsupportedOperation { library, operation }
    }

    /// Create a numerical failure error
    pub fn numerical(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Numerical {
            operation,
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Errors raised while resolving a benchmark: unknown library, bad
    /// parameters, bad configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownLibrary { .. } | Self::InvalidArgument { .. } | Self::Config(_)
        )
    }

    /// The adapter declined the operation; a driver may skip the case.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }

    /// A verification residual exceeded its tolerance.
    pub fn is_correctness_violation(&self) -> bool {
        matches!(self, Self::CorrectnessViolation { .. })
    }

    /// Whether a driver may keep running the benchmark after this error.
    pub fn is_recoverable(&self) -> bool {
        self.is_correctness_violation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let unknown = Error::UnknownLibrary {
            key: "blas".to_string(),
        };
        assert!(unknown.is_configuration());
        assert!(!unknown.is_unsupported());

        let unsupported = Error::unsupported("ndarray", OperationKind::Svd);
        assert!(unsupported.is_unsupported());
        assert!(!unsupported.is_configuration());
        assert!(!unsupported.is_recoverable());

        let violation = Error::CorrectnessViolation {
            library: "native",
            operation: OperationKind::Solve,
            dim: 10,
            residual: 1.0,
            tolerance: 1e-12,
        };
        assert!(violation.is_recoverable());
        assert!(!Error::shape_mismatch((2, 2), (2, 3)).is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = Error::shape_mismatch((3, 4), (4, 3));
        assert_eq!(err.to_string(), "Shape mismatch: expected (3, 4), got (4, 3)");
        let err = Error::unsupported("ndarray", OperationKind::Pseudoinverse);
        assert_eq!(err.to_string(), "ndarray does not support Pseudoinverse");
    }
}
