use super::LibraryAdapter;
use super::native::NativeLibrary;
use crate::benchmark::{PreparedOperation, Problem, VerificationPolicy, prepare};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Object-safe view of a [`LibraryAdapter`], so adapters with different
/// matrix types can sit in one registry.
pub trait Library: Send + Sync {
    /// Registry key
    fn key(&self) -> &'static str;

    /// Convert `problem` into this library's handles and prepare its contract
    fn prepare(
        &self,
        problem: &Problem,
        policy: VerificationPolicy,
    ) -> Result<Box<dyn PreparedOperation>>;
}

impl<L: LibraryAdapter> Library for L {
    fn key(&self) -> &'static str {
        self.name()
    }

    fn prepare(
        &self,
        problem: &Problem,
        policy: VerificationPolicy,
    ) -> Result<Box<dyn PreparedOperation>> {
        prepare(self.clone(), problem, policy)
    }
}

/// Libraries addressable by key.
///
/// Populated up front and read-only afterwards; share it behind an `Arc` or
/// by reference across threads.
#[derive(Clone)]
pub struct LibraryRegistry {
    libraries: BTreeMap<&'static str, Arc<dyn Library>>,
}

impl LibraryRegistry {
    /// Registry with no libraries
    pub fn empty() -> Self {
        Self {
            libraries: BTreeMap::new(),
        }
    }

    /// Every library compiled into this build
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.insert(NativeLibrary);
        #[cfg(feature = "nalgebra")]
        registry.insert(super::nalgebra::NalgebraLibrary);
        #[cfg(feature = "ndarray")]
        registry.insert(super::ndarray::NdarrayLibrary);
        registry
    }

    fn insert<L: LibraryAdapter>(&mut self, library: L) {
        self.libraries.insert(library.name(), Arc::new(library));
    }

    /// Add a library, rejecting a key that is already taken
    pub fn register<L: LibraryAdapter>(mut self, library: L) -> Result<Self> {
        let key = library.name();
        if self.libraries.contains_key(key) {
            return Err(Error::Config(format!("library '{key}' is already registered")));
        }
        self.insert(library);
        Ok(self)
    }

    /// Look up a library by its exact key
    pub fn get(&self, key: &str) -> Result<Arc<dyn Library>> {
        let library = self
            .libraries
            .get(key)
            .cloned()
            .ok_or_else(|| Error::UnknownLibrary {
                key: key.to_string(),
            })?;
        debug!(library = key, "resolved library");
        Ok(library)
    }

    /// Whether `key` is registered
    pub fn contains(&self, key: &str) -> bool {
        self.libraries.contains_key(key)
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.libraries.keys().copied()
    }

    /// Number of registered libraries
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    /// Whether no library is registered
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}

impl Default for LibraryRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for LibraryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}
