//! The fixed set of benchmarked operations

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Logical operation benchmarked against every library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    /// `C = A + B` into a caller-owned target
    Add,
    /// `C = s · A` into a caller-owned target
    Scale,
    /// `C = A · B`, freshly allocated
    MultiplyProduce,
    /// `C = A · B` into a caller-owned target
    MultiplyMutate,
    /// `A · X = B` for SPD `A` into a preallocated solution
    Solve,
    /// Eigenvectors of a symmetric matrix
    Eigenvectors,
    /// `[D, V]` of a symmetric matrix
    EigenDecomposition,
    /// `[U, Σ, Vᵗ]`
    Svd,
    /// Moore-Penrose pseudoinverse
    Pseudoinverse,
    /// Scalar determinant
    Determinant,
}

impl OperationKind {
    /// All kinds in benchmark order
    pub const ALL: [OperationKind; 10] = [
        Self::Add,
        Self::Scale,
        Self::MultiplyProduce,
        Self::MultiplyMutate,
        Self::Solve,
        Self::Eigenvectors,
        Self::EigenDecomposition,
        Self::Svd,
        Self::Pseudoinverse,
        Self::Determinant,
    ];

    /// Canonical name, also accepted by `FromStr`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Scale => "Scale",
            Self::MultiplyProduce => "MultiplyProduce",
            Self::MultiplyMutate => "MultiplyMutate",
            Self::Solve => "Solve",
            Self::Eigenvectors => "Eigenvectors",
            Self::EigenDecomposition => "EigenDecomposition",
            Self::Svd => "SVD",
            Self::Pseudoinverse => "Pseudoinverse",
            Self::Determinant => "Determinant",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(token))
            .or(match token.to_ascii_lowercase().as_str() {
                "evd" => Some(Self::EigenDecomposition),
                "fillbymultiplying" => Some(Self::MultiplyMutate),
                "det" => Some(Self::Determinant),
                "pinv" => Some(Self::Pseudoinverse),
                _ => None,
            })
            .ok_or_else(|| Error::invalid_argument("operation", format!("unknown operation '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("evd".parse::<OperationKind>().unwrap(), OperationKind::EigenDecomposition);
        assert_eq!(" svd ".parse::<OperationKind>().unwrap(), OperationKind::Svd);
        assert!("qr".parse::<OperationKind>().is_err());
    }
}
