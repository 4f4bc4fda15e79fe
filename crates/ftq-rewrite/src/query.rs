//! Rewritten query tree.
//!
//! Every leaf of a [`Query`] is bound to a [`ResolvedField`] and carries values already
//! converted to the field's type. The tree is what the serializer and dumper consume.

use std::{fmt, ops::Bound};

use ftq_config::{FieldMapping, FieldType};

/// A field after name and alias resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// Mapped field name.
    pub name: String,
    /// Canonical path written to the wire document.
    pub path: String,
    /// Value type.
    pub field_type: FieldType,
    /// Explicit analyzer, if any.
    pub analyzer: Option<String>,
    /// Enclosing nested object path, if any.
    pub nested: Option<String>,
}

impl ResolvedField {
    /// The analyzer in effect for this field.
    pub fn analyzer_name(&self) -> &str {
        self.field_type.analyzer_name(self.analyzer.as_deref())
    }
}

impl From<&FieldMapping> for ResolvedField {
    fn from(mapping: &FieldMapping) -> Self {
        Self {
            name: mapping.name.clone(),
            path: mapping.path.clone(),
            field_type: mapping.field_type,
            analyzer: mapping.analyzer.clone(),
            nested: mapping.nested.clone(),
        }
    }
}

/// A literal converted to its field's type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// String value (text, keyword and date fields).
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value.
    Boolean(bool),
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Clauses of a boolean query. Empty lists are omitted from the wire document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    /// Clauses that must match and contribute to the score.
    pub must: Vec<Query>,
    /// Clauses that must match without scoring.
    pub filter: Vec<Query>,
    /// Clauses of which at least one should match.
    pub should: Vec<Query>,
    /// Clauses that must not match.
    pub must_not: Vec<Query>,
}

impl BoolQuery {
    /// The clause lists paired with their wire labels, in output order.
    pub fn clauses(&self) -> [(&'static str, &[Query]); 4] {
        [
            ("must", self.must.as_slice()),
            ("filter", self.filter.as_slice()),
            ("should", self.should.as_slice()),
            ("must_not", self.must_not.as_slice()),
        ]
    }

    /// True if every clause list is empty.
    pub fn is_empty(&self) -> bool {
        self.clauses().iter().all(|(_, clauses)| clauses.is_empty())
    }
}

/// A canonical, field-resolved query.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Matches every document.
    MatchAll,
    /// Exact value on an unanalyzed field.
    Term {
        /// Target field.
        field: ResolvedField,
        /// Typed value.
        value: TypedValue,
    },
    /// Analyzed full-text match.
    Match {
        /// Target field.
        field: ResolvedField,
        /// Query text.
        text: String,
    },
    /// Ordered phrase with an optional slop.
    Phrase {
        /// Target field.
        field: ResolvedField,
        /// Phrase text.
        text: String,
        /// Allowed positional distance.
        slop: u32,
    },
    /// Value range.
    Range {
        /// Target field.
        field: ResolvedField,
        /// Lower end.
        lower: Bound<TypedValue>,
        /// Upper end.
        upper: Bound<TypedValue>,
    },
    /// `*` / `?` pattern.
    Wildcard {
        /// Target field.
        field: ResolvedField,
        /// Pattern.
        pattern: String,
    },
    /// Term within an edit distance.
    Fuzzy {
        /// Target field.
        field: ResolvedField,
        /// Term.
        value: String,
        /// Explicit edit distance.
        distance: Option<u8>,
    },
    /// Regular expression.
    Regex {
        /// Target field.
        field: ResolvedField,
        /// Pattern.
        pattern: String,
    },
    /// The field has a value.
    Exists {
        /// Target field.
        field: ResolvedField,
    },
    /// Query evaluated inside a nested object.
    Nested {
        /// Path of the nested object.
        path: String,
        /// Query on the nested documents.
        query: Box<Self>,
    },
    /// Boolean combination.
    Bool(BoolQuery),
    /// Score multiplier; the factor is never 1.0.
    Boost {
        /// Boosted query.
        query: Box<Self>,
        /// Multiplier.
        factor: f32,
    },
}

impl Query {
    /// Name of the node kind as used in the wire document.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MatchAll => "match_all",
            Self::Term { .. } => "term",
            Self::Match { .. } => "match",
            Self::Phrase { .. } => "match_phrase",
            Self::Range { .. } => "range",
            Self::Wildcard { .. } => "wildcard",
            Self::Fuzzy { .. } => "fuzzy",
            Self::Regex { .. } => "regexp",
            Self::Exists { .. } => "exists",
            Self::Nested { .. } => "nested",
            Self::Bool(_) => "bool",
            Self::Boost { query, .. } => query.kind(),
        }
    }

    /// The field a leaf targets; `None` for compound nodes and [`Query::MatchAll`].
    pub fn field(&self) -> Option<&ResolvedField> {
        match self {
            Self::Term { field, .. }
            | Self::Match { field, .. }
            | Self::Phrase { field, .. }
            | Self::Range { field, .. }
            | Self::Wildcard { field, .. }
            | Self::Fuzzy { field, .. }
            | Self::Regex { field, .. }
            | Self::Exists { field } => Some(field),
            Self::MatchAll | Self::Nested { .. } | Self::Bool(_) | Self::Boost { .. } => None,
        }
    }

    /// Wraps the query in a boost, unwrapping a factor of 1.0 and multiplying nested boosts.
    #[must_use]
    pub fn boosted(self, factor: f32) -> Self {
        let (query, factor) = match self {
            Self::Boost { query, factor: inner } => (*query, inner * factor),
            other => (other, factor),
        };
        if factor == 1.0 {
            return query;
        }
        Self::Boost {
            query: Box::new(query),
            factor,
        }
    }
}
