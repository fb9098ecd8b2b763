//! The benchmark lifecycle: configure, setup, execute, verify, teardown
//!
//! ```text
//! Uninitialized --configure--> Configured --setup--> Ready --teardown--> TornDown
//!                                                    |  ^
//!                                                    +--+ execute / verify
//! ```
//!
//! `setup` resolves the library, generates the inputs and prepares the
//! contract; all of that is excluded from timing. `execute` is the only
//! method a benchmark runner should measure.

mod prepared;
mod problem;
mod verify;

pub(crate) use prepared::prepare;
pub use prepared::PreparedOperation;
pub use problem::Problem;
pub use verify::{DEFAULT_TOLERANCE_FACTOR, Verification, VerificationPolicy};

use crate::error::{Error, Result};
use crate::library::LibraryRegistry;
use crate::operation::OperationKind;
use crate::reference::{EntryDistribution, ReferenceMatrix};
use std::fmt;
use tracing::{debug, warn};

/// Seed used when none is given
pub const DEFAULT_SEED: u64 = 0x5EED;

/// What to benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkParams {
    /// Square problem dimension, at least 1
    pub dimension: usize,
    /// Registry key of the library
    pub library: String,
    /// Operation to time
    pub operation: OperationKind,
    /// Input generation seed
    pub seed: u64,
    /// Distribution of generated entries
    pub distribution: EntryDistribution,
    /// Multiple of `dim · ε` residuals may reach
    pub tolerance_factor: f64,
}

impl BenchmarkParams {
    /// Parameters with the default seed, distribution and tolerance
    pub fn new(library: impl Into<String>, operation: OperationKind, dimension: usize) -> Self {
        Self {
            dimension,
            library: library.into(),
            operation,
            seed: DEFAULT_SEED,
            distribution: EntryDistribution::default(),
            tolerance_factor: DEFAULT_TOLERANCE_FACTOR,
        }
    }

    /// Replace the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the entry distribution
    pub fn with_distribution(mut self, distribution: EntryDistribution) -> Self {
        self.distribution = distribution;
        self
    }

    /// Replace the tolerance factor
    pub fn with_tolerance_factor(mut self, factor: f64) -> Self {
        self.tolerance_factor = factor;
        self
    }

    fn validate(&self) -> Result<VerificationPolicy> {
        if self.dimension == 0 {
            return Err(Error::invalid_argument("dimension", "must be at least 1"));
        }
        if self.library.is_empty() {
            return Err(Error::invalid_argument("library", "must not be empty"));
        }
        VerificationPolicy::new(self.tolerance_factor)
    }
}

/// Lifecycle position of a [`BenchmarkOperation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created, parameters not yet validated
    Uninitialized,
    /// Parameters validated
    Configured,
    /// Inputs and contract prepared; execute and verify are allowed
    Ready,
    /// Resources released; terminal
    TornDown,
}

impl LifecycleState {
    /// Name used in error messages
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Configured => "Configured",
            Self::Ready => "Ready",
            Self::TornDown => "TornDown",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(library, operation, dimension)` benchmark case.
///
/// Instances are independent: each owns its inputs, contract and output
/// buffers, so different instances may run on different threads.
pub struct BenchmarkOperation {
    params: BenchmarkParams,
    state: LifecycleState,
    policy: VerificationPolicy,
    prepared: Option<Box<dyn PreparedOperation>>,
}

impl BenchmarkOperation {
    /// New instance in the `Uninitialized` state
    pub fn new(params: BenchmarkParams) -> Self {
        Self {
            params,
            state: LifecycleState::Uninitialized,
            policy: VerificationPolicy::default(),
            prepared: None,
        }
    }

    /// The parameters
    pub fn params(&self) -> &BenchmarkParams {
        &self.params
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Validate the parameters. `Uninitialized -> Configured`.
    pub fn configure(&mut self) -> Result<()> {
        self.expect_state(LifecycleState::Uninitialized)?;
        self.policy = self.params.validate()?;
        self.state = LifecycleState::Configured;
        Ok(())
    }

    /// Resolve the library, generate inputs, prepare the contract and
    /// allocate targets. `Configured -> Ready`; an `Uninitialized` instance
    /// is configured first.
    ///
    /// On failure the instance stays `Configured`.
    pub fn setup(&mut self, registry: &LibraryRegistry) -> Result<()> {
        if self.state == LifecycleState::Uninitialized {
            self.configure()?;
        }
        self.expect_state(LifecycleState::Configured)?;

        let params = &self.params;
        let library = registry.get(&params.library)?;
        let problem = Problem::generate_with(
            params.operation,
            params.dimension,
            params.seed,
            params.distribution,
        )?;
        let prepared = library.prepare(&problem, self.policy)?;
        debug!(
            library = library.key(),
            operation = %params.operation,
            dim = params.dimension,
            "benchmark ready"
        );

        self.prepared = Some(prepared);
        self.state = LifecycleState::Ready;
        Ok(())
    }

    /// The timed call. Only valid when `Ready`.
    #[inline]
    pub fn execute(&mut self) -> Result<()> {
        self.ready()?.execute()
    }

    /// Check the latest output against its tolerance. Untimed; only valid
    /// when `Ready`.
    ///
    /// A residual over tolerance is returned as
    /// [`Error::CorrectnessViolation`]. The instance stays `Ready`.
    pub fn verify(&mut self) -> Result<Verification> {
        let library = self.ready()?.library();
        let (operation, dim) = (self.params.operation, self.params.dimension);
        let verification = self.ready()?.verify()?;
        verification
            .into_result(library, operation, dim)
            .inspect_err(|_| {
                warn!(
                    library,
                    operation = %operation,
                    dim,
                    residual = verification.residual,
                    tolerance = verification.tolerance,
                    "correctness violation"
                );
            })
    }

    /// Inputs as the library currently holds them. Only valid when `Ready`.
    pub fn inputs(&mut self) -> Result<Vec<ReferenceMatrix>> {
        Ok(self.ready()?.inputs())
    }

    /// Latest outputs in the interchange format. Only valid when `Ready`.
    pub fn outputs(&mut self) -> Result<Vec<ReferenceMatrix>> {
        self.ready()?.outputs()
    }

    /// Release inputs, contract and targets. `Ready -> TornDown`.
    pub fn teardown(&mut self) -> Result<()> {
        self.expect_state(LifecycleState::Ready)?;
        self.prepared = None;
        self.state = LifecycleState::TornDown;
        Ok(())
    }

    fn expect_state(&self, expected: LifecycleState) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidState {
                expected: expected.as_str(),
                actual: self.state.as_str(),
            });
        }
        Ok(())
    }

    fn ready(&mut self) -> Result<&mut Box<dyn PreparedOperation>> {
        let actual = self.state;
        match self.prepared.as_mut() {
            Some(prepared) if actual == LifecycleState::Ready => Ok(prepared),
            _ => Err(Error::InvalidState {
                expected: LifecycleState::Ready.as_str(),
                actual: actual.as_str(),
            }),
        }
    }
}

impl fmt::Debug for BenchmarkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BenchmarkOperation")
            .field("params", &self.params)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native(operation: OperationKind, dim: usize) -> BenchmarkOperation {
        BenchmarkOperation::new(BenchmarkParams::new("native", operation, dim))
    }

    #[test]
    fn test_execute_before_setup_is_invalid_state() {
        let mut op = native(OperationKind::Add, 4);
        assert_eq!(
            op.execute().unwrap_err(),
            Error::InvalidState {
                expected: "Ready",
                actual: "Uninitialized"
            }
        );
        op.configure().unwrap();
        assert!(matches!(op.verify(), Err(Error::InvalidState { .. })));
    }

    #[test]
    fn test_full_lifecycle() {
        let registry = LibraryRegistry::with_defaults();
        let mut op = native(OperationKind::MultiplyMutate, 8);
        op.setup(&registry).unwrap();
        assert_eq!(op.state(), LifecycleState::Ready);
        for _ in 0..3 {
            op.execute().unwrap();
        }
        assert!(op.verify().unwrap().passed());
        op.teardown().unwrap();
        assert_eq!(op.state(), LifecycleState::TornDown);
        assert!(op.execute().is_err());
        assert!(op.teardown().is_err());
    }

    #[test]
    fn test_configure_twice_is_invalid() {
        let mut op = native(OperationKind::Scale, 2);
        op.configure().unwrap();
        assert!(matches!(
            op.configure(),
            Err(Error::InvalidState {
                expected: "Uninitialized",
                actual: "Configured"
            })
        ));
    }

    #[test]
    fn test_failed_setup_stays_configured() {
        let registry = LibraryRegistry::with_defaults();
        let mut op = BenchmarkOperation::new(BenchmarkParams::new("mtj", OperationKind::Add, 4));
        assert!(matches!(
            op.setup(&registry),
            Err(Error::UnknownLibrary { .. })
        ));
        assert_eq!(op.state(), LifecycleState::Configured);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut op = native(OperationKind::Add, 0);
        assert!(op.configure().unwrap_err().is_configuration());
        assert_eq!(op.state(), LifecycleState::Uninitialized);

        let mut op = BenchmarkOperation::new(
            BenchmarkParams::new("native", OperationKind::Add, 3).with_tolerance_factor(-1.0),
        );
        assert!(op.configure().is_err());
    }

    #[test]
    fn test_every_native_operation_verifies() {
        let registry = LibraryRegistry::with_defaults();
        for kind in OperationKind::ALL {
            let mut op = native(kind, 12);
            op.setup(&registry).unwrap();
            op.execute().unwrap();
            let verification = op.verify().unwrap();
            assert!(
                verification.passed(),
                "{kind}: residual {} > {}",
                verification.residual,
                verification.tolerance
            );
        }
    }
}
