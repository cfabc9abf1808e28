//! Quarry capture compiler.
//!
//! Turns capture blocks of a host front-end dump into serialized XR:
//! - `host` - the typed host tree the front-end hands us
//! - `parse` - structural parsers from host shapes to XR
//! - `select_order` - select-clause ordering validation
//! - `container` - Uprootable / Pluckable capture containers
//! - `chain` - owner-chain resolution through functions, fields and variables
//! - `store` - the cross-module capture store
//! - `beta` - substitution used to inline captured functions
//! - `diagnostics` - per-capture error reporting
//! - `compile` - the driver tying it together

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod beta;
pub mod chain;
pub mod compile;
pub mod config;
pub mod container;
pub mod diagnostics;
pub mod dynamics;
pub mod host;
pub mod parse;
pub mod select_order;
pub mod store;

#[cfg(test)]
pub mod test_utils;


pub use compile::{CompiledUnit, compile};
pub use config::{Config, StoreConfig};
pub use container::{CaptureContainer, ParamsModel, RuntimesModel};
pub use diagnostics::{DiagnosticKind, Diagnostics, DiagnosticsPrinter, Severity};
pub use dynamics::{DynamicsAccum, ParamKind};
pub use store::{CrossModuleStore, StoreError};

/// Fatal errors. They terminate the compilation unit immediately; everything
/// else is reported as a diagnostic against the offending capture.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A foreign declaration was used to share a capture it cannot share.
    #[error("`{path}` cannot share its capture across modules: {fix}")]
    CrossModuleEligibility {
        name: String,
        path: String,
        fix: &'static str,
    },

    #[error("cross-module store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("invalid compilation unit: {0}")]
    InvalidUnit(String),
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, Error>;
