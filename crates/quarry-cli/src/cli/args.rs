//! Argument definitions.
//!
//! `check` and `dump` share the store flags through [`StoreArgs`], so both
//! commands compile a unit against the same cross-module store setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::ColorChoice;

#[derive(Parser, Debug)]
#[command(name = "quarry", bin_name = "quarry", version)]
#[command(about = "Compile captured query blocks into serialized XR")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a unit and report diagnostics
    #[command(after_help = r#"EXAMPLES:
  quarry check unit.json
  quarry check unit.json --strict
  quarry check unit.json --store-dir build/quarry --source-set app --dep lib
  quarry check - < unit.json"#)]
    Check(CheckCommand),

    /// Compile a unit and print every installed container
    #[command(after_help = r#"EXAMPLES:
  quarry dump unit.json
  quarry dump unit.json --no-cross-module
  quarry dump unit.json --json | jq '.sites'"#)]
    Dump(DumpCommand),
}

#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Front-end dump of the compilation unit (JSON), or `-` for stdin
    #[arg(value_name = "UNIT")]
    pub unit_path: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,

    /// Colorize output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,
}

#[derive(Args, Debug)]
pub struct DumpCommand {
    /// Front-end dump of the compilation unit (JSON), or `-` for stdin
    #[arg(value_name = "UNIT")]
    pub unit_path: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Print the containers as JSON
    #[arg(long)]
    pub json: bool,

    /// Colorize output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,
}

/// Cross-module store flags.
#[derive(Args, Debug, Default)]
pub struct StoreArgs {
    /// Directory holding the store namespaces
    #[arg(long, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Source-set this unit belongs to
    #[arg(long, value_name = "NAME")]
    pub source_set: Option<String>,

    /// Source-set searched after the primary one (repeatable)
    #[arg(long = "dep", value_name = "NAME")]
    pub deps: Vec<String>,

    /// Do not share captures across modules
    #[arg(long)]
    pub no_cross_module: bool,

    /// Bounded wait for the store lock
    #[arg(long, value_name = "N")]
    pub lock_timeout_ms: Option<u64>,
}
