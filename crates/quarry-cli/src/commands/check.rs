use std::path::PathBuf;

use quarry_compiler::Config;

use super::run_common::{compile_or_exit, render_diagnostics};

pub struct CheckArgs {
    pub unit_path: PathBuf,
    pub config: Config,
    pub strict: bool,
    pub color: bool,
}

pub fn run(args: CheckArgs) {
    let compiled = compile_or_exit(&args.unit_path, &args.config);

    let diagnostics = &compiled.diagnostics;
    let is_valid = if args.strict {
        !diagnostics.has_errors() && !diagnostics.has_warnings()
    } else {
        !diagnostics.has_errors()
    };

    if !is_valid {
        eprint!(
            "{}",
            render_diagnostics(&compiled, &args.unit_path, args.color)
        );
        std::process::exit(1);
    }

    // Silent on success (like cargo check)
}
