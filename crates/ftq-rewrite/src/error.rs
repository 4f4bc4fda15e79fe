//! Error types for the ftq-rewrite crate.

use ftq_config::FieldType;
use ftq_query::QueryError;
use thiserror::Error;

/// Errors raised while resolving a parsed query against the field mappings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// A field scope names a field that is not mapped and no default field is configured.
    #[error("unknown field '{field_name}'")]
    UnknownField {
        /// The field as written in the query.
        field_name: String,
    },

    /// An unscoped value was found but no default field is configured.
    #[error("no default field configured for unscoped value '{value}'")]
    NoDefaultField {
        /// The unscoped literal.
        value: String,
    },

    /// A range bound does not fit the field's type.
    #[error("range bound '{bound}' on field '{field}' is not {expected}")]
    RangeType {
        /// Field the range applies to.
        field: String,
        /// The offending bound.
        bound: String,
        /// What the field accepts.
        expected: String,
    },

    /// A term value does not parse as the field's type.
    #[error("value '{value}' on field '{field}' is not {expected}")]
    TermType {
        /// Field the term applies to.
        field: String,
        /// The offending value.
        value: String,
        /// What the field accepts.
        expected: String,
    },

    /// A pattern leaf was applied to a field that does not hold strings.
    #[error("{kind} queries are not supported on {field_type} field '{field}'")]
    IncompatibleLeaf {
        /// Field the leaf applies to.
        field: String,
        /// Leaf kind (`wildcard`, `fuzzy`, `regex`).
        kind: String,
        /// Declared type of the field.
        field_type: FieldType,
    },
}

/// A rewritten node that has no representation in the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot serialize {node} node: {reason}")]
pub struct SerializationError {
    /// Kind of the node that failed.
    pub node: String,
    /// Why it failed.
    pub reason: String,
}

impl SerializationError {
    /// Creates a serialization error.
    pub(crate) fn new(node: &str, reason: impl Into<String>) -> Self {
        Self {
            node: node.to_string(),
            reason: reason.into(),
        }
    }
}

/// Any failure along the parse, rewrite, serialize pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The query string did not lex or parse.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// The query did not resolve against the mappings.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    /// The rewritten query could not be rendered.
    #[error(transparent)]
    Serialize(#[from] SerializationError),
}
