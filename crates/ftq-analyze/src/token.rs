//! Analyzed field tokens and their canonical order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One term produced by analyzing a field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Canonical path of the field the value belongs to.
    pub field_name: String,
    /// The analyzed term.
    pub term: String,
    /// Position of the term within the field value.
    pub position: u32,
    /// Byte offset of the term's first character in the original value.
    pub start_offset: usize,
    /// Byte offset just past the term's last character.
    pub end_offset: usize,
}

impl Token {
    /// Creates a token.
    pub fn new(
        field_name: impl Into<String>,
        term: impl Into<String>,
        position: u32,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            term: term.into(),
            position,
            start_offset,
            end_offset,
        }
    }

    /// Compares by field name, then position.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.field_name
            .cmp(&other.field_name)
            .then(self.position.cmp(&other.position))
    }
}

/// A field value after analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedField {
    /// Canonical path of the field.
    pub field_name: String,
    /// Tokens in position order.
    pub tokens: Vec<Token>,
}

/// Sorts tokens by field name, then position. Ties keep their relative order.
pub fn sort_tokens(tokens: &mut [Token]) {
    tokens.sort_by(Token::canonical_cmp);
}

/// Collects tokens into a vector in canonical order.
pub fn sorted_tokens(tokens: impl IntoIterator<Item = Token>) -> Vec<Token> {
    let mut tokens: Vec<Token> = tokens.into_iter().collect();
    sort_tokens(&mut tokens);
    tokens
}
