//! Command-line interface for the `ftq` query rewriter.

use std::process::ExitCode;

use clap::Parser;
use env_logger::{Builder, Env};
use ftq::cli::{
    CommandContext,
    args::{Cli, Commands},
    commands,
};

/// Installs the logger; `-v` and `-vv` raise the default filter, `RUST_LOG` wins.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Parses arguments, loads configuration, and runs the selected command.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = match cli.command {
        Commands::Init(_) => CommandContext::load_cwd_only(),
        _ => CommandContext::load(),
    };
    match ctx {
        Ok(ctx) => commands::run(cli.command, &ctx),
        Err(code) => code,
    }
}
