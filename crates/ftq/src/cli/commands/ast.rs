//! Implementation of `ftq ast`.

use std::process::ExitCode;

use ftq_query::{QueryError, tokenize};
use ftq_rewrite::QueryRewriter;

use crate::cli::{
    args::AstCommand,
    context::CommandContext,
    output::{dim, failure, is_tty, print_dump},
};

/// Shows the rewritten tree, the parsed tree, or the token stream of a query.
pub fn run(ctx: &CommandContext, cmd: &AstCommand) -> ExitCode {
    if cmd.tokens {
        return print_tokens(&cmd.query);
    }

    let target = match ctx.target(&cmd.target) {
        Ok(target) => target,
        Err(code) => return code,
    };
    let rewriter = match QueryRewriter::new(
        target.index.as_str(),
        &target.mappings,
        target.options,
        &cmd.query,
    ) {
        Ok(rewriter) => rewriter,
        Err(e) => return failure(e),
    };

    if cmd.parsed {
        match rewriter.parsed() {
            Some(expr) => {
                print!("{expr}");
                let canonical = format!("canonical: {}", expr.to_query_string());
                println!("{}", if is_tty() { dim(&canonical) } else { canonical });
            }
            None => println!("(empty)"),
        }
        return ExitCode::SUCCESS;
    }

    match rewriter.dump() {
        Ok(dump) => {
            print_dump(&dump);
            ExitCode::SUCCESS
        }
        Err(e) => failure(e),
    }
}

/// Prints one token per line with its byte offset.
fn print_tokens(query: &str) -> ExitCode {
    let tokens = match tokenize(query) {
        Ok(tokens) => tokens,
        Err(e) => return failure(QueryError::lex(e.reason, e.offset, query)),
    };
    for token in tokens {
        println!("{:>4}  {}", token.offset, token.kind);
    }
    ExitCode::SUCCESS
}
