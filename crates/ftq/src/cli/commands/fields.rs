//! Implementation of `ftq fields`.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use ftq_config::{CONFIG_FILENAME, FieldMapping};
use serde::Serialize;

use crate::cli::{
    args::FieldsCommand,
    context::CommandContext,
    output::{dim, print_json, subheader},
};

/// JSON output for one mapped field.
#[derive(Serialize)]
struct JsonField<'a> {
    /// Name used in queries.
    name: &'a str,
    /// Canonical path in the index.
    path: &'a str,
    /// Value type.
    #[serde(rename = "type")]
    field_type: &'static str,
    /// Analyzer in effect.
    analyzer: &'a str,
    /// Enclosing nested object.
    #[serde(skip_serializing_if = "Option::is_none")]
    nested: Option<&'a str>,
    /// Alternative names.
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    aliases: &'a [String],
}

impl<'a> From<&'a FieldMapping> for JsonField<'a> {
    fn from(field: &'a FieldMapping) -> Self {
        Self {
            name: &field.name,
            path: &field.path,
            field_type: field.field_type.as_str(),
            analyzer: field.analyzer_name(),
            nested: field.nested.as_deref(),
            aliases: &field.aliases,
        }
    }
}

/// Lists every mapped field of the configured index.
pub fn run(ctx: &CommandContext, cmd: &FieldsCommand) -> ExitCode {
    let mappings = match ctx.mappings(cmd.mapping.as_deref()) {
        Ok(mappings) => mappings,
        Err(code) => return code,
    };
    let mut fields: Vec<&FieldMapping> = mappings.fields().iter().collect();
    fields.sort_by(|a, b| a.name.cmp(&b.name));

    if cmd.json {
        let json: Vec<JsonField<'_>> = fields.into_iter().map(JsonField::from).collect();
        return match print_json(&json, false) {
            Ok(()) => ExitCode::SUCCESS,
            Err(code) => code,
        };
    }

    println!(
        "{}",
        subheader(&format!("Fields of index '{}':", ctx.config.index.name))
    );
    if fields.is_empty() {
        println!("   {}", dim("(none mapped)"));
        println!();
        println!(
            "Declare [fields.NAME] tables or an [index] mapping file in {}.",
            subheader(CONFIG_FILENAME)
        );
        return ExitCode::SUCCESS;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Name", "Path", "Type", "Analyzer", "Nested", "Aliases"]);
    for field in &fields {
        table.add_row(vec![
            Cell::new(&field.name),
            Cell::new(&field.path),
            Cell::new(field.field_type),
            Cell::new(field.analyzer_name()),
            Cell::new(field.nested.as_deref().unwrap_or("")),
            Cell::new(field.aliases.join(", ")),
        ]);
    }
    println!("{table}");

    if let Some(default_field) = &ctx.config.index.default_field {
        println!("{}", dim(&format!("default field: {default_field}")));
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use ftq_config::FieldType;

    use super::*;

    #[test]
    fn json_field_shape() {
        let field = FieldMapping::new("heading", FieldType::Text)
            .with_path("title")
            .with_alias("h");
        let value = serde_json::to_value(JsonField::from(&field)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "heading",
                "path": "title",
                "type": "text",
                "analyzer": "standard",
                "aliases": ["h"]
            })
        );
    }
}
