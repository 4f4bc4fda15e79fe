//! Implementation of `ftq highlight`.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use ftq_analyze::{AnalyzedField, analyze_field, highlight};
use ftq_config::FieldLookup;
use ftq_rewrite::QueryRewriter;

use crate::cli::{
    args::HighlightCommand,
    context::CommandContext,
    output::{dim, failure, print_json},
};

/// Analyzes the given field values and prints the tokens the query matches.
pub fn run(ctx: &CommandContext, cmd: &HighlightCommand) -> ExitCode {
    let target = match ctx.target(&cmd.target) {
        Ok(target) => target,
        Err(code) => return code,
    };

    let mut fields: Vec<AnalyzedField> = Vec::with_capacity(cmd.texts.len());
    for (name, value) in &cmd.texts {
        let Some(mapping) = target.mappings.lookup(name) else {
            return failure(format!("unknown field '{name}'"));
        };
        match analyze_field(mapping, value) {
            Ok(analyzed) => fields.push(analyzed),
            Err(e) => return failure(e),
        }
    }

    let rewriter = match QueryRewriter::new(
        target.index.as_str(),
        &target.mappings,
        target.options,
        &cmd.query,
    ) {
        Ok(rewriter) => rewriter,
        Err(e) => return failure(e),
    };
    let query = match rewriter.rewrite() {
        Ok(query) => query,
        Err(e) => return failure(e),
    };
    let tokens = match highlight(&query, &fields) {
        Ok(tokens) => tokens,
        Err(e) => return failure(e),
    };

    if cmd.json {
        return match print_json(&tokens, false) {
            Ok(()) => ExitCode::SUCCESS,
            Err(code) => code,
        };
    }

    if tokens.is_empty() {
        println!("{}", dim("No matching tokens."));
        return ExitCode::SUCCESS;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Field", "Term", "Position", "Offsets"]);
    for token in &tokens {
        table.add_row(vec![
            Cell::new(&token.field_name),
            Cell::new(&token.term),
            Cell::new(token.position.to_string()),
            Cell::new(format!("{}..{}", token.start_offset, token.end_offset)),
        ]);
    }
    println!("{table}");

    ExitCode::SUCCESS
}
