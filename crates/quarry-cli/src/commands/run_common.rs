//! Steps shared by `check` and `dump`.

use std::path::Path;

use quarry_compiler::{CompiledUnit, Config, DiagnosticsPrinter, compile};

use super::unit_loader::load_unit;

/// Load and compile a unit, exiting on anything fatal.
pub fn compile_or_exit(unit_path: &Path, config: &Config) -> CompiledUnit {
    let unit = match load_unit(unit_path) {
        Ok(unit) => unit,
        Err(msg) => {
            eprintln!("error: {}", msg);
            std::process::exit(1);
        }
    };

    log::debug!(
        "store: enabled={} root={} source-set={}",
        config.store_config().is_enabled(),
        config.store_config().root_dir().display(),
        config.store_config().primary()
    );

    match compile(&unit, config) {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Render the unit's diagnostics, with snippets when the dump carried source.
pub fn render_diagnostics(compiled: &CompiledUnit, unit_path: &Path, color: bool) -> String {
    let path = unit_path.to_string_lossy();
    let mut printer = DiagnosticsPrinter::new(&compiled.diagnostics)
        .path(&path)
        .colored(color);
    if let Some(source) = &compiled.source {
        printer = printer.source(source);
    }
    printer.render()
}
