//! Tests for CLI dispatch logic.
//!
//! These tests verify:
//! 1. Store flags are shared by check and dump
//! 2. Flags fold into the compiler configuration
//! 3. Params extraction: correct fields are extracted from parsed commands

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use quarry_compiler::{Config, StoreConfig};

use super::*;

fn parse(args: &[&str]) -> Command {
    let mut argv = vec!["quarry"];
    argv.extend_from_slice(args);
    match Cli::try_parse_from(argv) {
        Ok(cli) => cli.command,
        Err(e) => panic!("arguments should parse: {e}"),
    }
}

fn check(args: &[&str]) -> CheckParams {
    match parse(args) {
        Command::Check(m) => CheckParams::from_command(m),
        other => panic!("expected check, got {other:?}"),
    }
}

fn dump(args: &[&str]) -> DumpParams {
    match parse(args) {
        Command::Dump(m) => DumpParams::from_command(m),
        other => panic!("expected dump, got {other:?}"),
    }
}

#[test]
fn check_defaults() {
    let params = check(&["check", "unit.json"]);

    assert_eq!(params.unit_path, PathBuf::from("unit.json"));
    assert_eq!(params.config, Config::new());
    assert!(!params.strict);
    assert_eq!(params.color, ColorChoice::Auto);
}

#[test]
fn check_store_flags_fold_into_config() {
    let params = check(&[
        "check",
        "unit.json",
        "--store-dir",
        "build/quarry",
        "--source-set",
        "app",
        "--dep",
        "lib",
        "--dep",
        "common",
        "--lock-timeout-ms",
        "250",
        "--strict",
    ]);

    let expected = Config::new().store(
        StoreConfig::new()
            .root("build/quarry")
            .source_set("app")
            .dependency("lib")
            .dependency("common")
            .lock_timeout(Duration::from_millis(250)),
    );
    assert_eq!(params.config, expected);
    assert_eq!(params.config.store_config().dependencies(), ["lib", "common"]);
    assert!(params.strict);
}

#[test]
fn no_cross_module_disables_store() {
    let params = dump(&["dump", "unit.json", "--no-cross-module"]);
    assert!(!params.config.store_config().is_enabled());
}

#[test]
fn dump_accepts_store_flags() {
    let params = dump(&["dump", "-", "--source-set", "test", "--dep", "main"]);

    assert_eq!(params.unit_path, PathBuf::from("-"));
    assert_eq!(params.config.store_config().primary(), "test");
    assert_eq!(params.config.store_config().dependencies(), ["main"]);
}

#[test]
fn dump_json_flag() {
    assert!(dump(&["dump", "unit.json", "--json"]).json);
    assert!(!dump(&["dump", "unit.json"]).json);
}

#[test]
fn dump_rejects_strict() {
    let result = Cli::try_parse_from(["quarry", "dump", "unit.json", "--strict"]);
    assert!(result.is_err(), "dump should not accept --strict");
}

#[test]
fn unit_is_required() {
    let result = Cli::try_parse_from(["quarry", "check"]);
    assert!(result.is_err());
}

#[test]
fn color_flag_is_parsed() {
    assert_eq!(check(&["check", "u.json", "--color", "never"]).color, ColorChoice::Never);
    assert_eq!(dump(&["dump", "u.json", "--color", "always"]).color, ColorChoice::Always);
    assert!(!ColorChoice::Never.should_colorize());
    assert!(ColorChoice::Always.should_colorize());
}

#[test]
fn lock_timeout_must_be_a_number() {
    let result = Cli::try_parse_from(["quarry", "check", "u.json", "--lock-timeout-ms", "soon"]);
    assert!(result.is_err());
}

#[test]
fn help_lists_store_flags() {
    use clap::CommandFactory;

    let mut cmd = Cli::command();
    let check = cmd
        .find_subcommand_mut("check")
        .expect("check subcommand")
        .render_help()
        .to_string();
    assert!(check.contains("--store-dir"));
    assert!(check.contains("--dep"));
    assert!(check.contains("--no-cross-module"));
}
