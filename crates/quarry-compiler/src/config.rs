//! Compilation configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the cross-module capture store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Whether captures may be shared across compilation units
    pub(crate) enabled: bool,
    /// Directory holding one namespace file per source-set
    pub(crate) root: PathBuf,
    /// Source-set this compilation writes into
    pub(crate) source_set: String,
    /// Source-sets searched after the primary one, in order
    pub(crate) dependencies: Vec<String>,
    /// Bounded wait for the namespace lock
    pub(crate) lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: PathBuf::from(".quarry"),
            source_set: "main".to_string(),
            dependencies: Vec::new(),
            lock_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether cross-module captures are enabled.
    pub fn enabled(mut self, value: bool) -> Self {
        self.enabled = value;
        self
    }

    /// Set the store directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = path.into();
        self
    }

    /// Set the primary source-set.
    pub fn source_set(mut self, name: impl Into<String>) -> Self {
        self.source_set = name.into();
        self
    }

    /// Append a dependency source-set.
    pub fn dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// Set the lock wait bound.
    pub fn lock_timeout(mut self, value: Duration) -> Self {
        self.lock_timeout = value;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    pub fn primary(&self) -> &str {
        &self.source_set
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// Configuration for one compilation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub(crate) store: StoreConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, value: StoreConfig) -> Self {
        self.store = value;
        self
    }

    pub fn store_config(&self) -> &StoreConfig {
        &self.store
    }
}
