//! Implementation of `ftq config`.

use std::process::ExitCode;

use ftq_style::Highlighter;

use crate::cli::{
    context::CommandContext,
    output::{failure, is_tty},
};

/// Shows the effective configuration as TOML.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let toml = match ctx.config.to_toml() {
        Ok(toml) => toml,
        Err(e) => return failure(e),
    };
    if is_tty() {
        print!("{}", Highlighter::new().highlight_toml(&toml));
    } else {
        print!("{toml}");
    }
    ExitCode::SUCCESS
}
