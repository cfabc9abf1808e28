//! Dispatch logic: turn parsed commands into command args.
//!
//! - `*Params` hold what a command actually uses, with store flags already
//!   folded into a [`Config`]
//! - `Into<*Args>` impls bridge dispatch to command handlers

use std::path::PathBuf;
use std::time::Duration;

use quarry_compiler::{Config, StoreConfig};

use super::{CheckCommand, ColorChoice, DumpCommand, StoreArgs};
use crate::commands::check::CheckArgs;
use crate::commands::dump::DumpArgs;

pub struct CheckParams {
    pub unit_path: PathBuf,
    pub config: Config,
    pub strict: bool,
    pub color: ColorChoice,
}

impl CheckParams {
    pub fn from_command(m: CheckCommand) -> Self {
        Self {
            unit_path: m.unit_path,
            config: build_config(&m.store),
            strict: m.strict,
            color: m.color,
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            unit_path: p.unit_path,
            config: p.config,
            strict: p.strict,
            color: p.color.should_colorize(),
        }
    }
}

pub struct DumpParams {
    pub unit_path: PathBuf,
    pub config: Config,
    pub json: bool,
    pub color: ColorChoice,
}

impl DumpParams {
    pub fn from_command(m: DumpCommand) -> Self {
        Self {
            unit_path: m.unit_path,
            config: build_config(&m.store),
            json: m.json,
            color: m.color,
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            unit_path: p.unit_path,
            config: p.config,
            json: p.json,
            color: p.color.should_colorize(),
        }
    }
}

/// Fold store flags over the default configuration.
pub fn build_config(args: &StoreArgs) -> Config {
    let mut store = StoreConfig::new().enabled(!args.no_cross_module);
    if let Some(dir) = &args.store_dir {
        store = store.root(dir);
    }
    if let Some(name) = &args.source_set {
        store = store.source_set(name);
    }
    for dep in &args.deps {
        store = store.dependency(dep);
    }
    if let Some(ms) = args.lock_timeout_ms {
        store = store.lock_timeout(Duration::from_millis(ms));
    }
    Config::new().store(store)
}
