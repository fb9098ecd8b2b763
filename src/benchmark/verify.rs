//! Residual tolerances
//!
//! Every residual is judged against `factor · dim · ε · scale`, where `scale`
//! is the magnitude the residual is naturally proportional to (for example
//! `‖A‖·‖B‖` for a product). A NaN residual never passes.

use crate::error::{Error, Result};
use crate::operation::OperationKind;

/// Default multiple of `dim · ε` a residual may reach.
pub const DEFAULT_TOLERANCE_FACTOR: f64 = 1000.0;

/// How strict verification is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationPolicy {
    factor: f64,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            factor: DEFAULT_TOLERANCE_FACTOR,
        }
    }
}

impl VerificationPolicy {
    /// Policy with a custom tolerance factor, which must be finite and positive
    pub fn new(factor: f64) -> Result<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(Error::invalid_argument(
                "tolerance_factor",
                format!("must be finite and positive, got {factor}"),
            ));
        }
        Ok(Self { factor })
    }

    /// The tolerance factor
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// `factor · dim · ε · scale`
    pub fn tolerance(&self, dim: usize, scale: f64) -> f64 {
        self.factor * dim.max(1) as f64 * f64::EPSILON * scale.abs()
    }

    /// Pair a residual with the tolerance for `(dim, scale)`
    pub fn assess(&self, dim: usize, residual: f64, scale: f64) -> Verification {
        Verification {
            residual,
            tolerance: self.tolerance(dim, scale),
        }
    }
}

/// Outcome of one verification: the measured residual and what it is
/// allowed to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verification {
    /// Measured residual
    pub residual: f64,
    /// Allowed residual
    pub tolerance: f64,
}

impl Verification {
    /// A residual of exactly zero, used when outputs match bit for bit
    pub fn exact() -> Self {
        Self {
            residual: 0.0,
            tolerance: 0.0,
        }
    }

    /// Whether the residual is within tolerance. NaN fails.
    pub fn passed(&self) -> bool {
        self.residual <= self.tolerance
    }

    /// `Ok(self)` when passed, otherwise a correctness violation
    pub fn into_result(
        self,
        library: &'static str,
        operation: OperationKind,
        dim: usize,
    ) -> Result<Self> {
        if self.passed() {
            Ok(self)
        } else {
            Err(Error::CorrectnessViolation {
                library,
                operation,
                dim,
                residual: self.residual,
                tolerance: self.tolerance,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_scales_with_dim_and_magnitude() {
        let policy = VerificationPolicy::default();
        let base = policy.tolerance(10, 1.0);
        assert_eq!(base, 1000.0 * 10.0 * f64::EPSILON);
        assert_eq!(policy.tolerance(20, 1.0), 2.0 * base);
        assert_eq!(policy.tolerance(10, -3.0), 3.0 * base);
    }

    #[test]
    fn test_nan_residual_fails() {
        let v = VerificationPolicy::default().assess(4, f64::NAN, 1.0);
        assert!(!v.passed());
        let err = v.into_result("native", OperationKind::Svd, 4).unwrap_err();
        assert!(err.is_correctness_violation());
    }

    #[test]
    fn test_zero_residual_passes_zero_tolerance() {
        assert!(Verification::exact().passed());
        assert!(VerificationPolicy::default().assess(3, 0.0, 0.0).passed());
    }

    #[test]
    fn test_rejects_bad_factor() {
        assert!(VerificationPolicy::new(0.0).is_err());
        assert!(VerificationPolicy::new(f64::INFINITY).is_err());
        assert_eq!(VerificationPolicy::new(10.0).unwrap().factor(), 10.0);
    }
}
