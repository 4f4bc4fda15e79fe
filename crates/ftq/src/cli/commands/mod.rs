//! Command implementations and dispatch.

pub mod ast;
pub mod check;
pub mod config;
pub mod fields;
pub mod highlight;
pub mod init;
pub mod rewrite;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: Commands, ctx: &CommandContext) -> ExitCode {
    match command {
        Commands::Rewrite(cmd) => rewrite::run(ctx, &cmd),
        Commands::Ast(cmd) => ast::run(ctx, &cmd),
        Commands::Highlight(cmd) => highlight::run(ctx, &cmd),
        Commands::Fields(cmd) => fields::run(ctx, &cmd),
        Commands::Init(cmd) => init::run(ctx, &cmd),
        Commands::Check => check::run(ctx),
        Commands::Config => config::run(ctx),
    }
}
