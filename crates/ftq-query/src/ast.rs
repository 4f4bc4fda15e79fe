//! Query abstract syntax tree.
//!
//! Represents parsed query expressions before field resolution and rewriting.

use std::fmt;

/// Boolean combinator of a [`QueryExpr::Bool`] group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    /// All children must match.
    And,
    /// At least one child must match.
    Or,
    /// No child may match.
    Not,
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "And",
            Self::Or => "Or",
            Self::Not => "Not",
        })
    }
}

/// One end of a range literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeBound {
    /// Open end (`*`).
    Unbounded,
    /// The value itself is part of the range (`[` or `]`).
    Inclusive(String),
    /// The value itself is excluded (`{` or `}`).
    Exclusive(String),
}

impl RangeBound {
    /// Returns the bound's value, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Unbounded => None,
            Self::Inclusive(v) | Self::Exclusive(v) => Some(v),
        }
    }
}

/// The literal part of a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafKind {
    /// A single search term.
    Term(String),
    /// An exact phrase; `slop` is the allowed positional distance (0 = exact).
    Phrase {
        /// Phrase text with whitespace collapsed to single spaces.
        text: String,
        /// Allowed positional distance between phrase words.
        slop: u32,
    },
    /// A range of values.
    Range {
        /// Lower end.
        lower: RangeBound,
        /// Upper end.
        upper: RangeBound,
    },
    /// A pattern with `*` and `?` metacharacters.
    Wildcard(String),
    /// A term matched within an edit distance.
    Fuzzy {
        /// The term.
        value: String,
        /// Explicit edit distance; `None` leaves the choice to the engine.
        distance: Option<u8>,
    },
    /// A regular expression.
    Regex(String),
}

impl LeafKind {
    /// Short lowercase name of the leaf kind, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Term(_) => "term",
            Self::Phrase { .. } => "phrase",
            Self::Range { .. } => "range",
            Self::Wildcard(_) => "wildcard",
            Self::Fuzzy { .. } => "fuzzy",
            Self::Regex(_) => "regex",
        }
    }
}

/// A leaf of the query tree: a literal plus the field it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Field the leaf was scoped to, or `None` for the default field.
    pub field: Option<String>,
    /// The literal.
    pub kind: LeafKind,
}

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpr {
    /// A literal, optionally field-scoped (`title:guide`).
    Leaf(Leaf),

    /// Field-scoped group: every leaf inside `expr` applies to `name`.
    Field {
        /// Field name.
        name: String,
        /// Group the scope applies to.
        expr: Box<Self>,
    },

    /// Boolean group with a non-empty, ordered list of children.
    Bool {
        /// Combinator.
        op: BoolOp,
        /// Operands.
        children: Vec<Self>,
    },

    /// Boosted query: multiplies the score of the inner expression.
    Boost {
        /// The expression to boost.
        expr: Box<Self>,
        /// The boost factor (e.g., 2.5 means 2.5x the normal score).
        factor: f32,
    },
}

impl QueryExpr {
    /// Creates a leaf expression.
    pub fn leaf(field: Option<&str>, kind: LeafKind) -> Self {
        Self::Leaf(Leaf {
            field: field.map(String::from),
            kind,
        })
    }

    /// Creates an unscoped term.
    pub fn term(value: impl Into<String>) -> Self {
        Self::leaf(None, LeafKind::Term(value.into()))
    }

    /// Creates an And expression, flattening nested Ands.
    pub fn and(exprs: Vec<Self>) -> Self {
        Self::group(BoolOp::And, exprs)
    }

    /// Creates an Or expression, flattening nested Ors.
    pub fn or(exprs: Vec<Self>) -> Self {
        Self::group(BoolOp::Or, exprs)
    }

    /// Creates a negation of a single expression.
    pub fn not(expr: Self) -> Self {
        Self::Bool {
            op: BoolOp::Not,
            children: vec![expr],
        }
    }

    /// Creates a boosted expression.
    pub fn boost(expr: Self, factor: f32) -> Self {
        Self::Boost {
            expr: Box::new(expr),
            factor,
        }
    }

    /// Builds an And/Or group, flattening children of the same operator and unwrapping a
    /// single child.
    fn group(op: BoolOp, exprs: Vec<Self>) -> Self {
        let mut flattened: Vec<Self> = exprs
            .into_iter()
            .flat_map(|e| match e {
                Self::Bool {
                    op: inner,
                    children,
                } if inner == op => children,
                other => vec![other],
            })
            .collect();

        if flattened.len() == 1
            && let Some(only) = flattened.pop()
        {
            return only;
        }
        Self::Bool {
            op,
            children: flattened,
        }
    }

    /// Returns true if this expression scopes any part of itself to a field.
    pub fn has_field_scope(&self) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.field.is_some(),
            Self::Field { .. } => true,
            Self::Bool { children, .. } => children.iter().any(Self::has_field_scope),
            Self::Boost { expr, .. } => expr.has_field_scope(),
        }
    }

    /// Formats the expression as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Leaf(leaf) => {
                let field = leaf.field.as_deref().unwrap_or("_");
                match &leaf.kind {
                    LeafKind::Term(s) => writeln!(f, "{prefix}Term({field}, {s:?})"),
                    LeafKind::Phrase { text, slop } => {
                        writeln!(f, "{prefix}Phrase({field}, {text:?}, slop={slop})")
                    }
                    LeafKind::Range { lower, upper } => {
                        writeln!(f, "{prefix}Range({field}, {lower:?}, {upper:?})")
                    }
                    LeafKind::Wildcard(p) => writeln!(f, "{prefix}Wildcard({field}, {p:?})"),
                    LeafKind::Fuzzy { value, distance } => {
                        writeln!(f, "{prefix}Fuzzy({field}, {value:?}, {distance:?})")
                    }
                    LeafKind::Regex(p) => writeln!(f, "{prefix}Regex({field}, {p:?})"),
                }
            }
            Self::Field { name, expr } => {
                writeln!(f, "{prefix}Field({name:?})")?;
                expr.fmt_tree(f, indent + 1)
            }
            Self::Bool { op, children } => {
                writeln!(f, "{prefix}{op}")?;
                for child in children {
                    child.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Boost { expr, factor } => {
                writeln!(f, "{prefix}Boost({factor})")?;
                expr.fmt_tree(f, indent + 1)
            }
        }
    }

    /// Formats the expression as a query string that parses back to an equivalent tree.
    ///
    /// This produces output like: `title:guide^2.5 (rust OR "error handling")`
    pub fn to_query_string(&self) -> String {
        self.fmt_query_string(Precedence::Or)
    }

    /// Renders this node, parenthesizing when it binds looser than `context`.
    fn fmt_query_string(&self, context: Precedence) -> String {
        match self {
            Self::Leaf(leaf) => {
                let literal = leaf_literal(&leaf.kind);
                match &leaf.field {
                    Some(field) => format!("{}:{literal}", escape_term(field)),
                    None => literal,
                }
            }
            Self::Field { name, expr } => {
                format!(
                    "{}:({})",
                    escape_term(name),
                    expr.fmt_query_string(Precedence::Or)
                )
            }
            Self::Bool { op, children } => {
                let (own, separator) = match op {
                    BoolOp::Or => (Precedence::Or, " OR "),
                    BoolOp::And => (Precedence::And, " "),
                    BoolOp::Not => (Precedence::Unary, " "),
                };
                let rendered = match op {
                    BoolOp::Not => children
                        .iter()
                        .map(|c| format!("-{}", c.fmt_query_string(Precedence::Unary)))
                        .collect::<Vec<_>>()
                        .join(separator),
                    BoolOp::And | BoolOp::Or => children
                        .iter()
                        .map(|c| c.fmt_query_string(own.tighter()))
                        .collect::<Vec<_>>()
                        .join(separator),
                };
                // A multi-child NOT is a conjunction of negations.
                let own = if *op == BoolOp::Not && children.len() > 1 {
                    Precedence::And
                } else {
                    own
                };
                if own < context {
                    format!("({rendered})")
                } else {
                    rendered
                }
            }
            Self::Boost { expr, factor } => {
                format!("{}^{factor}", expr.fmt_query_string(Precedence::Atom))
            }
        }
    }
}

/// Binding strength used when rendering query strings, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    /// OR operands.
    Or,
    /// AND operands.
    And,
    /// Operand of NOT.
    Unary,
    /// Operand of a boost suffix.
    Atom,
}

impl Precedence {
    /// The precedence operands of this operator must have.
    fn tighter(self) -> Self {
        match self {
            Self::Or => Self::And,
            Self::And | Self::Unary | Self::Atom => Self::Unary,
        }
    }
}

/// Renders a leaf literal without its field prefix.
fn leaf_literal(kind: &LeafKind) -> String {
    match kind {
        LeafKind::Term(s) => escape_term(s),
        LeafKind::Phrase { text, slop } => {
            let quoted = format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""));
            if *slop > 0 {
                format!("{quoted}~{slop}")
            } else {
                quoted
            }
        }
        LeafKind::Range { lower, upper } => {
            let open = if matches!(lower, RangeBound::Exclusive(_)) {
                '{'
            } else {
                '['
            };
            let close = if matches!(upper, RangeBound::Exclusive(_)) {
                '}'
            } else {
                ']'
            };
            let bound = |b: &RangeBound| b.value().map_or_else(|| "*".to_string(), escape_term);
            format!("{open}{} TO {}{close}", bound(lower), bound(upper))
        }
        LeafKind::Wildcard(p) => p.clone(),
        LeafKind::Fuzzy { value, distance } => match distance {
            Some(d) => format!("{}~{d}", escape_term(value)),
            None => format!("{}~", escape_term(value)),
        },
        LeafKind::Regex(p) => format!("/{}/", p.replace('/', "\\/")),
    }
}

/// Characters that end or alter a bare word anywhere in it.
const SPECIAL_CHARS: &[char] = &[
    '\\', '(', ')', '"', '^', '~', '[', ']', '{', '}', ':', '*', '?',
];

/// Characters that only matter at the start of a word.
const LEADING_CHARS: &[char] = &['-', '/', '<', '>'];

/// Escapes a term so the lexer reads it back as the same literal text.
fn escape_term(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, ch) in s.chars().enumerate() {
        if SPECIAL_CHARS.contains(&ch)
            || ch.is_whitespace()
            || (i == 0 && LEADING_CHARS.contains(&ch))
        {
            out.push('\\');
        }
        out.push(ch);
    }
    if ["AND", "OR", "NOT"]
        .iter()
        .any(|kw| out.eq_ignore_ascii_case(kw))
    {
        out.insert(0, '\\');
    }
    out
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}
