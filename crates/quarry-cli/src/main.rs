mod cli;
mod commands;

use clap::Parser;
use cli::{CheckParams, Cli, Command, DumpParams};

fn main() {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check(m) => {
            let params = CheckParams::from_command(m);
            commands::check::run(params.into());
        }
        Command::Dump(m) => {
            let params = DumpParams::from_command(m);
            commands::dump::run(params.into());
        }
    }
}
