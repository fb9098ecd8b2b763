//! Sweep driver: every configured `(dim, library, operation)` case through
//! the full lifecycle

use crate::benchmark::{BenchmarkOperation, BenchmarkParams};
use crate::config::SuiteConfig;
use crate::error::{Error, Result};
use crate::library::LibraryRegistry;
use crate::operation::OperationKind;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// How one case ended
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    /// Every execution succeeded and every verification passed
    Completed {
        /// Mean wall time of one execution
        mean: Duration,
        /// Number of verifications that ran
        verified: usize,
    },
    /// The library declines the operation
    Skipped(String),
    /// A verification exceeded its tolerance; timings are discarded
    Untrustworthy {
        /// Measured residual
        residual: f64,
        /// Allowed residual
        tolerance: f64,
    },
    /// Configuration, shape or numerical failure
    Failed(Error),
}

/// One case and its outcome
#[derive(Debug, Clone, PartialEq)]
pub struct CaseReport {
    /// Registry key
    pub library: String,
    /// Operation
    pub operation: OperationKind,
    /// Problem dimension
    pub dim: usize,
    /// Outcome
    pub outcome: CaseOutcome,
}

/// Outcomes of a whole sweep, ordered by library, then dimension, then
/// operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuiteReport {
    cases: Vec<CaseReport>,
}

impl SuiteReport {
    /// Every case
    pub fn cases(&self) -> &[CaseReport] {
        &self.cases
    }

    /// Cases whose results failed verification
    pub fn untrustworthy(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases
            .iter()
            .filter(|c| matches!(c.outcome, CaseOutcome::Untrustworthy { .. }))
    }

    /// Cases that completed
    pub fn completed(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases
            .iter()
            .filter(|c| matches!(c.outcome, CaseOutcome::Completed { .. }))
    }

    /// Cases skipped as unsupported
    pub fn skipped(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases
            .iter()
            .filter(|c| matches!(c.outcome, CaseOutcome::Skipped(_)))
    }

    /// Cases that failed outright
    pub fn failed(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases
            .iter()
            .filter(|c| matches!(c.outcome, CaseOutcome::Failed(_)))
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for case in &self.cases {
            write!(
                f,
                "{:<10} {:<20} {:>6}  ",
                case.library,
                case.operation.as_str(),
                case.dim
            )?;
            match &case.outcome {
                CaseOutcome::Completed { mean, verified } => {
                    writeln!(f, "{mean:.3?}  verified x{verified}")?
                }
                CaseOutcome::Skipped(reason) => writeln!(f, "skipped: {reason}")?,
                CaseOutcome::Untrustworthy {
                    residual,
                    tolerance,
                } => writeln!(
                    f,
                    "UNTRUSTWORTHY residual {residual:e} > tolerance {tolerance:e}"
                )?,
                CaseOutcome::Failed(err) => writeln!(f, "failed: {err}")?,
            }
        }
        Ok(())
    }
}

/// Run every case in `config` against `registry`.
///
/// Individual case failures are recorded in the report and never abort the
/// sweep; only an invalid configuration is an error. With the `rayon`
/// feature, libraries are swept in parallel.
pub fn run_suite(config: &SuiteConfig, registry: &LibraryRegistry) -> Result<SuiteReport> {
    config.validate()?;
    info!(
        libraries = config.libraries.len(),
        operations = config.operations.len(),
        dimensions = config.dimensions.len(),
        "starting suite"
    );

    #[cfg(feature = "rayon")]
    let per_library: Vec<Vec<CaseReport>> = config
        .libraries
        .par_iter()
        .map(|library| run_library(config, registry, library))
        .collect();
    #[cfg(not(feature = "rayon"))]
    let per_library: Vec<Vec<CaseReport>> = config
        .libraries
        .iter()
        .map(|library| run_library(config, registry, library))
        .collect();

    let report = SuiteReport {
        cases: per_library.into_iter().flatten().collect(),
    };
    info!(
        completed = report.completed().count(),
        skipped = report.skipped().count(),
        untrustworthy = report.untrustworthy().count(),
        failed = report.failed().count(),
        "suite finished"
    );
    Ok(report)
}

fn run_library(config: &SuiteConfig, registry: &LibraryRegistry, library: &str) -> Vec<CaseReport> {
    let mut cases = Vec::with_capacity(config.dimensions.len() * config.operations.len());
    for &dim in &config.dimensions {
        for &operation in &config.operations {
            let params = BenchmarkParams::new(library, operation, dim)
                .with_seed(config.seed)
                .with_distribution(config.distribution)
                .with_tolerance_factor(config.tolerance_factor);
            let outcome = run_case(params, config.iterations, config.verify_interval, registry);
            cases.push(CaseReport {
                library: library.to_string(),
                operation,
                dim,
                outcome,
            });
        }
    }
    cases
}

/// One case: setup, `iterations` timed executions with periodic
/// verification, teardown.
pub fn run_case(
    params: BenchmarkParams,
    iterations: usize,
    verify_interval: usize,
    registry: &LibraryRegistry,
) -> CaseOutcome {
    let (library, operation, dim) = (params.library.clone(), params.operation, params.dimension);
    let mut benchmark = BenchmarkOperation::new(params);
    if let Err(err) = benchmark.setup(registry) {
        return classify(err, &library, operation, dim);
    }

    let mut total = Duration::ZERO;
    let mut verified = 0;
    for i in 1..=iterations {
        let start = Instant::now();
        let result = benchmark.execute();
        total += start.elapsed();
        if let Err(err) = result {
            return classify(err, &library, operation, dim);
        }

        if i % verify_interval.max(1) == 0 || i == iterations {
            match benchmark.verify() {
                Ok(_) => verified += 1,
                Err(err) => return classify(err, &library, operation, dim),
            }
        }
    }

    if let Err(err) = benchmark.teardown() {
        return CaseOutcome::Failed(err);
    }
    let mean = mean_duration(total, iterations);
    info!(library = %library, operation = %operation, dim, ?mean, "case completed");
    CaseOutcome::Completed { mean, verified }
}

fn mean_duration(total: Duration, iterations: usize) -> Duration {
    total.div_f64(iterations.max(1) as f64)
}

fn classify(err: Error, library: &str, operation: OperationKind, dim: usize) -> CaseOutcome {
    match err {
        Error::UnsupportedOperation { .. } => {
            info!(library, operation = %operation, dim, "skipping unsupported operation");
            CaseOutcome::Skipped(err.to_string())
        }
        Error::CorrectnessViolation {
            residual,
            tolerance,
            ..
        } => CaseOutcome::Untrustworthy {
            residual,
            tolerance,
        },
        err => {
            warn!(library, operation = %operation, dim, error = %err, "case failed");
            CaseOutcome::Failed(err)
        }
    }
}
