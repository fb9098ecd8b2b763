//! Suite configuration from defaults and `MATBENCH_*` environment variables

use crate::benchmark::{DEFAULT_SEED, DEFAULT_TOLERANCE_FACTOR};
use crate::error::{Error, Result};
use crate::library::LibraryRegistry;
use crate::operation::OperationKind;
use crate::reference::EntryDistribution;
use std::env;
use std::str::FromStr;

/// Sweep of `dimensions × libraries × operations` run by
/// [`run_suite`](crate::suite::run_suite).
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    /// Square problem sizes
    pub dimensions: Vec<usize>,
    /// Registry keys of the libraries to compare
    pub libraries: Vec<String>,
    /// Operations to time
    pub operations: Vec<OperationKind>,
    /// Input generation seed
    pub seed: u64,
    /// Distribution of generated entries
    pub distribution: EntryDistribution,
    /// Timed executions per case
    pub iterations: usize,
    /// Verify after every this many executions (and after the last one)
    pub verify_interval: usize,
    /// Multiple of `dim · ε` residuals may reach
    pub tolerance_factor: f64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            dimensions: vec![10, 50, 100],
            libraries: LibraryRegistry::with_defaults()
                .keys()
                .map(String::from)
                .collect(),
            operations: OperationKind::ALL.to_vec(),
            seed: DEFAULT_SEED,
            distribution: EntryDistribution::Uniform,
            iterations: 10,
            verify_interval: 10,
            tolerance_factor: DEFAULT_TOLERANCE_FACTOR,
        }
    }
}

impl SuiteConfig {
    /// Defaults overridden by whichever of these variables are set:
    ///
    /// | variable | example |
    /// |----------|---------|
    /// | `MATBENCH_DIMS` | `10,100,1000` |
    /// | `MATBENCH_LIBS` | `native,nalgebra` |
    /// | `MATBENCH_OPS` | `add,svd,det` |
    /// | `MATBENCH_SEED` | `42` |
    /// | `MATBENCH_DIST` | `normal` |
    /// | `MATBENCH_ITERATIONS` | `20` |
    /// | `MATBENCH_VERIFY_INTERVAL` | `5` |
    /// | `MATBENCH_TOLERANCE` | `100` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(v) = lookup("MATBENCH_DIMS") {
            cfg.dimensions = parse_list("MATBENCH_DIMS", &v)?;
        }
        if let Some(v) = lookup("MATBENCH_LIBS") {
            cfg.libraries = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("MATBENCH_OPS") {
            cfg.operations = parse_list("MATBENCH_OPS", &v)?;
        }
        if let Some(v) = lookup("MATBENCH_SEED") {
            cfg.seed = parse_value("MATBENCH_SEED", &v)?;
        }
        if let Some(v) = lookup("MATBENCH_DIST") {
            cfg.distribution = parse_value("MATBENCH_DIST", &v)?;
        }
        if let Some(v) = lookup("MATBENCH_ITERATIONS") {
            cfg.iterations = parse_value("MATBENCH_ITERATIONS", &v)?;
        }
        if let Some(v) = lookup("MATBENCH_VERIFY_INTERVAL") {
            cfg.verify_interval = parse_value("MATBENCH_VERIFY_INTERVAL", &v)?;
        }
        if let Some(v) = lookup("MATBENCH_TOLERANCE") {
            cfg.tolerance_factor = parse_value("MATBENCH_TOLERANCE", &v)?;
        }

        Ok(cfg)
    }

    /// Reject configurations that cannot run
    pub fn validate(&self) -> Result<()> {
        if self.dimensions.is_empty() {
            return Err(Error::Config("dimensions must not be empty".into()));
        }
        if self.dimensions.contains(&0) {
            return Err(Error::Config("dimensions must be >= 1".into()));
        }
        if self.libraries.is_empty() {
            return Err(Error::Config("libraries must not be empty".into()));
        }
        if self.operations.is_empty() {
            return Err(Error::Config("operations must not be empty".into()));
        }
        if self.iterations == 0 {
            return Err(Error::Config("iterations must be >= 1".into()));
        }
        if self.verify_interval == 0 {
            return Err(Error::Config("verify_interval must be >= 1".into()));
        }
        if !(self.tolerance_factor.is_finite() && self.tolerance_factor > 0.0) {
            return Err(Error::Config(format!(
                "tolerance_factor must be finite and positive, got {}",
                self.tolerance_factor
            )));
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for {key}: '{value}'")))
}

fn parse_list<T: FromStr>(key: &str, value: &str) -> Result<Vec<T>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| parse_value(key, item))
        .collect()
}
