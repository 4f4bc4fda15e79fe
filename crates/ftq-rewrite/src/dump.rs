//! AST dumper.
//!
//! Renders a [`Query`] as an indented tree, one node per line, for inspection and tests.

use std::ops::Bound;

use crate::{Query, TypedValue};

/// Renders the query tree with two spaces of indentation per level and no trailing newline.
///
/// ```text
/// Bool
///   must:
///     Match(body, "rust")
///   must_not:
///     Term(status, "closed")
/// ```
pub fn dump(query: &Query) -> String {
    let mut lines = Vec::new();
    dump_node(query, 0, &mut lines);
    lines.join("\n")
}

/// Appends the lines of one node and its children.
fn dump_node(query: &Query, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let line = match query {
        Query::MatchAll => "MatchAll".to_string(),
        Query::Term { field, value } => format!("Term({}, {value})", field.path),
        Query::Match { field, text } => format!("Match({}, {text:?})", field.path),
        Query::Phrase { field, text, slop } if *slop > 0 => {
            format!("Phrase({}, {text:?}, slop={slop})", field.path)
        }
        Query::Phrase { field, text, .. } => format!("Phrase({}, {text:?})", field.path),
        Query::Range {
            field,
            lower,
            upper,
        } => {
            let mut parts = vec![field.path.clone()];
            parts.extend(bound(lower, "gte", "gt"));
            parts.extend(bound(upper, "lte", "lt"));
            format!("Range({})", parts.join(", "))
        }
        Query::Wildcard { field, pattern } => format!("Wildcard({}, {pattern:?})", field.path),
        Query::Fuzzy {
            field,
            value,
            distance: Some(distance),
        } => format!("Fuzzy({}, {value:?}, distance={distance})", field.path),
        Query::Fuzzy { field, value, .. } => format!("Fuzzy({}, {value:?})", field.path),
        Query::Regex { field, pattern } => format!("Regex({}, {pattern:?})", field.path),
        Query::Exists { field } => format!("Exists({})", field.path),
        Query::Nested { path, query } => {
            lines.push(format!("{indent}Nested({path})"));
            dump_node(query, depth + 1, lines);
            return;
        }
        Query::Bool(clauses) => {
            lines.push(format!("{indent}Bool"));
            for (label, queries) in clauses.clauses() {
                if queries.is_empty() {
                    continue;
                }
                lines.push(format!("{indent}  {label}:"));
                for child in queries {
                    dump_node(child, depth + 2, lines);
                }
            }
            return;
        }
        Query::Boost { query, factor } => {
            lines.push(format!("{indent}Boost({factor})"));
            dump_node(query, depth + 1, lines);
            return;
        }
    };
    lines.push(format!("{indent}{line}"));
}

/// Formats a range end as `key=value`.
fn bound(bound: &Bound<TypedValue>, inclusive: &str, exclusive: &str) -> Option<String> {
    match bound {
        Bound::Included(value) => Some(format!("{inclusive}={value}")),
        Bound::Excluded(value) => Some(format!("{exclusive}={value}")),
        Bound::Unbounded => None,
    }
}
