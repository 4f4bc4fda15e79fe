//! Implementation of `ftq rewrite`.

use std::process::ExitCode;

use ftq_rewrite::QueryRewriter;
use log::info;

use crate::cli::{
    args::RewriteCommand,
    context::CommandContext,
    output::{failure, print_json},
};

/// Rewrites each query and prints its wire document.
pub fn run(ctx: &CommandContext, cmd: &RewriteCommand) -> ExitCode {
    let target = match ctx.target(&cmd.target) {
        Ok(target) => target,
        Err(code) => return code,
    };

    for query in &cmd.queries {
        let rewriter = match QueryRewriter::new(
            target.index.as_str(),
            &target.mappings,
            target.options.clone(),
            query,
        ) {
            Ok(rewriter) => rewriter,
            Err(e) => return failure(e),
        };

        let document = match rewriter.to_json() {
            Ok(document) => document,
            Err(e) => return failure(e),
        };
        info!("rewrote query for index '{}'", rewriter.index());

        if let Err(code) = print_json(&document, cmd.compact) {
            return code;
        }
    }

    ExitCode::SUCCESS
}
