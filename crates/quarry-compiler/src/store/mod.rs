//! Cross-module capture store.
//!
//! Lets a separately compiled unit reuse the already-resolved XR of an
//! `inline` declaration instead of re-parsing its body. Each source-set owns
//! one namespace file; a compilation writes only into its primary namespace
//! and reads its dependencies' namespaces, first hit wins.

mod key;
mod lock;
mod namespace;

#[cfg(test)]
mod store_tests;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use quarry_core::{ContainerTag, SerializedXr};

use crate::config::StoreConfig;
use crate::host::Decl;

pub use key::store_key;

use lock::LockFile;
use namespace::Namespace;

/// Name of the map holding serialized captures.
pub const CAPTURES_MAP: &str = "captures";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("timed out after {timeout:?} waiting for store lock {}", path.display())]
    LockTimeout { path: PathBuf, timeout: Duration },

    #[error("corrupt store namespace `{namespace}`: {reason}")]
    Corrupt { namespace: String, reason: String },

    #[error("store io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Outcome of a store lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(SerializedXr),
    /// An entry exists but holds a different kind of capture. It is left in place.
    KindMismatch { found: ContainerTag },
    Missing,
}

struct OpenStore {
    /// Held for as long as the primary namespace may be written.
    _lock: LockFile,
    primary: Namespace,
    dependencies: Vec<Namespace>,
}

pub struct CrossModuleStore {
    config: StoreConfig,
    state: Option<OpenStore>,
}

impl CrossModuleStore {
    /// Create a store handle. Nothing is touched on disk until first use.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Run `f` with a store that is closed on every exit path.
    ///
    /// An error from `f` takes precedence over an error while closing.
    pub fn scoped<T>(
        config: StoreConfig,
        f: impl FnOnce(&mut CrossModuleStore) -> crate::Result<T>,
    ) -> crate::Result<T> {
        let mut store = Self::new(config);
        let result = f(&mut store);
        let closed = store.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Whether a foreign declaration may share its capture through the store.
    pub fn is_eligible(&self, decl: &Decl) -> bool {
        self.config.enabled && decl.inline
    }

    fn open(&mut self) -> Result<&mut OpenStore, StoreError> {
        let state = match self.state.take() {
            Some(state) => state,
            None => Self::load(&self.config)?,
        };
        Ok(self.state.insert(state))
    }

    fn load(config: &StoreConfig) -> Result<OpenStore, StoreError> {
        std::fs::create_dir_all(&config.root).map_err(|source| StoreError::Io {
            path: config.root.clone(),
            source,
        })?;
        let lock = LockFile::acquire(
            config.root.join(format!("{}.lock", config.source_set)),
            config.lock_timeout,
        )?;
        let primary = Namespace::open(&config.root, &config.source_set, false)?;
        let dependencies = config
            .dependencies
            .iter()
            .map(|name| Namespace::open(&config.root, name, true))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "opened cross-module store at {} (primary `{}`, {} dependencies, lock {})",
            config.root.display(),
            config.source_set,
            dependencies.len(),
            lock.path().display()
        );
        Ok(OpenStore {
            _lock: lock,
            primary,
            dependencies,
        })
    }

    /// Look a declaration's capture up: primary first, then dependencies in order.
    pub fn get_stored(&mut self, decl: &Decl, kind: ContainerTag) -> Result<Lookup, StoreError> {
        if !self.config.enabled {
            return Ok(Lookup::Missing);
        }
        let key = store_key(decl);
        let state = self.open()?;
        let namespaces = std::iter::once(&state.primary).chain(&state.dependencies);

        for namespace in namespaces {
            let Some(raw) = namespace.get(CAPTURES_MAP, &key) else {
                continue;
            };
            let xr = SerializedXr::from_raw(raw);
            let found = xr.tag().map_err(|e| StoreError::Corrupt {
                namespace: namespace.name().to_string(),
                reason: format!("entry `{key}`: {e}"),
            })?;
            if found != kind {
                log::warn!(
                    "stale store entry `{key}` in `{}`: expected {kind}, found {found}",
                    namespace.name()
                );
                return Ok(Lookup::KindMismatch { found });
            }
            log::debug!("store hit `{key}` in `{}`", namespace.name());
            return Ok(Lookup::Found(xr));
        }

        log::debug!("store miss `{key}`");
        Ok(Lookup::Missing)
    }

    /// Record a declaration's capture in the primary namespace.
    pub fn put_stored(
        &mut self,
        decl: &Decl,
        kind: ContainerTag,
        xr: &SerializedXr,
    ) -> Result<(), StoreError> {
        if !self.config.enabled {
            return Ok(());
        }
        let key = store_key(decl);
        let state = self.open()?;
        log::debug!("store put `{key}` ({kind}) into `{}`", state.primary.name());
        state
            .primary
            .put(CAPTURES_MAP, key, xr.as_str().to_string());
        Ok(())
    }

    /// Flush the primary namespace if it changed and release the lock.
    pub fn close(&mut self) -> Result<(), StoreError> {
        let Some(mut state) = self.state.take() else {
            return Ok(());
        };
        if state.primary.is_dirty() {
            state.primary.flush()?;
        }
        log::debug!("closed cross-module store at {}", self.config.root.display());
        Ok(())
    }
}

impl Drop for CrossModuleStore {
    fn drop(&mut self) {
        if self.state.is_some() {
            log::debug!("cross-module store dropped without close; changes discarded");
        }
    }
}
