//! Query parser.
//!
//! Parses a token stream into a query AST using recursive descent.
//!
//! # Grammar
//!
//! ```text
//! query      → or_expr
//! or_expr    → and_expr ("OR" and_expr)*
//! and_expr   → unary (("AND")? unary)*
//! unary      → ("NOT" | "-") unary | scoped
//! scoped     → FIELD_PREFIX field_body | boosted
//! field_body → COMPARATOR bound | leaf boost? | "(" or_expr ")" boost?
//! boosted    → (leaf | "(" or_expr ")") boost?
//! leaf       → TERM fuzzy? | WILDCARD | PHRASE slop? | REGEX | range
//! range      → ("[" | "{") bound "TO" bound ("]" | "}")
//! bound      → TERM | PHRASE | "*"
//! ```
//!
//! # Precedence (highest to lowest)
//!
//! 1. Leaf literals and grouping: `(...)`
//! 2. Boost suffix: `^N`
//! 3. Field prefix: `field:`
//! 4. Negation: `NOT`, `-`
//! 5. AND (explicit or implicit between adjacent operands)
//! 6. OR

use std::mem;

use crate::{
    ast::{LeafKind, QueryExpr, RangeBound},
    error::{ParseError, QueryError},
    lexer::{Comparator, Token, TokenKind, tokenize},
};

/// Largest edit distance accepted after `~`.
const MAX_FUZZY_DISTANCE: u32 = 2;

/// Deepest nesting of groups and negations a query may have.
pub const MAX_DEPTH: usize = 128;

/// Recursive descent parser for query expressions.
struct Parser {
    /// Token stream to parse.
    tokens: Vec<Token>,
    /// Current position in token stream.
    position: usize,
    /// Byte length of the input; the offset reported for errors at end of query.
    input_len: usize,
    /// Groups and negations currently open.
    depth: usize,
}

impl Parser {
    /// Creates a new parser from a token stream.
    fn new(tokens: Vec<Token>, input_len: usize) -> Self {
        Self {
            tokens,
            position: 0,
            input_len,
            depth: 0,
        }
    }

    /// Parses the token stream into a query expression.
    fn parse(mut self) -> Result<Option<QueryExpr>, ParseError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let expr = self.parse_or_expr()?;

        if self.position < self.tokens.len() {
            return Err(self.error("end of query"));
        }

        Ok(Some(expr))
    }

    /// Parses: or_expr → and_expr ("OR" and_expr)*
    fn parse_or_expr(&mut self) -> Result<QueryExpr, ParseError> {
        let mut operands = vec![self.parse_and_expr()?];

        while self.check(&TokenKind::Or) {
            self.advance(); // consume OR
            operands.push(self.parse_and_expr()?);
        }

        Ok(QueryExpr::or(operands))
    }

    /// Parses: and_expr → unary (("AND")? unary)*
    fn parse_and_expr(&mut self) -> Result<QueryExpr, ParseError> {
        let mut operands = vec![self.parse_unary()?];

        loop {
            if self.check(&TokenKind::And) {
                self.advance(); // consume AND
                operands.push(self.parse_unary()?);
            } else if self.can_start_unary() {
                operands.push(self.parse_unary()?);
            } else {
                break;
            }
        }

        Ok(QueryExpr::and(operands))
    }

    /// Checks if the current token can start a unary expression.
    fn can_start_unary(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(
                TokenKind::Term(_)
                    | TokenKind::Wildcard(_)
                    | TokenKind::Phrase(_)
                    | TokenKind::Regex(_)
                    | TokenKind::Not
                    | TokenKind::LParen
                    | TokenKind::FieldPrefix(_)
                    | TokenKind::RangeOpen { .. }
            )
        )
    }

    /// Parses: unary → ("NOT" | "-") unary | scoped
    fn parse_unary(&mut self) -> Result<QueryExpr, ParseError> {
        if self.check(&TokenKind::Not) {
            self.enter()?;
            self.advance(); // consume NOT or -
            let expr = self.parse_unary()?;
            self.depth -= 1;
            return Ok(QueryExpr::not(expr));
        }

        if let Some(TokenKind::FieldPrefix(name)) = self.peek_kind().cloned() {
            self.advance();
            return self.parse_field_body(&name);
        }

        self.parse_boosted()
    }

    /// Parses what follows a field prefix.
    fn parse_field_body(&mut self, name: &str) -> Result<QueryExpr, ParseError> {
        match self.peek_kind().cloned() {
            Some(TokenKind::Comparator(op)) => {
                self.advance();
                let value = self.parse_comparison_value(name)?;
                let (lower, upper) = match op {
                    Comparator::Gt => (RangeBound::Exclusive(value), RangeBound::Unbounded),
                    Comparator::Gte => (RangeBound::Inclusive(value), RangeBound::Unbounded),
                    Comparator::Lt => (RangeBound::Unbounded, RangeBound::Exclusive(value)),
                    Comparator::Lte => (RangeBound::Unbounded, RangeBound::Inclusive(value)),
                };
                Ok(QueryExpr::leaf(Some(name), LeafKind::Range { lower, upper }))
            }
            Some(TokenKind::LParen) => {
                let group_offset = self.current_offset();
                let inner = self.parse_group()?;
                if inner.has_field_scope() {
                    return Err(ParseError::new(
                        group_offset,
                        format!("a group without field scopes after '{name}:'"),
                        "a nested field scope",
                    ));
                }
                let expr = QueryExpr::Field {
                    name: name.to_string(),
                    expr: Box::new(inner),
                };
                self.maybe_apply_boost(expr)
            }
            Some(kind) if Self::starts_leaf(&kind) => {
                let kind = self.parse_leaf()?;
                self.maybe_apply_boost(QueryExpr::leaf(Some(name), kind))
            }
            _ => Err(self.error(format!("a value after '{name}:'"))),
        }
    }

    /// Parses: boosted → (leaf | "(" or_expr ")") boost?
    fn parse_boosted(&mut self) -> Result<QueryExpr, ParseError> {
        let expr = match self.peek_kind().cloned() {
            Some(TokenKind::LParen) => self.parse_group()?,
            Some(kind) if Self::starts_leaf(&kind) => QueryExpr::leaf(None, self.parse_leaf()?),
            _ => return Err(self.error("an expression")),
        };

        self.maybe_apply_boost(expr)
    }

    /// True if a token of this kind begins a leaf literal.
    fn starts_leaf(kind: &TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Term(_)
                | TokenKind::Wildcard(_)
                | TokenKind::Phrase(_)
                | TokenKind::Regex(_)
                | TokenKind::RangeOpen { .. }
        )
    }

    /// Parses: leaf → TERM fuzzy? | WILDCARD | PHRASE slop? | REGEX | range
    fn parse_leaf(&mut self) -> Result<LeafKind, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("a term"));
        };

        let kind = match token.kind {
            TokenKind::Term(value) => {
                self.advance();
                match self.peek_kind() {
                    Some(&TokenKind::Tilde(distance)) => {
                        if distance.is_some_and(|d| d > MAX_FUZZY_DISTANCE) {
                            return Err(self.error(format!(
                                "a fuzzy distance between 0 and {MAX_FUZZY_DISTANCE}"
                            )));
                        }
                        self.advance();
                        LeafKind::Fuzzy {
                            value,
                            distance: distance.and_then(|d| u8::try_from(d).ok()),
                        }
                    }
                    _ => LeafKind::Term(value),
                }
            }
            TokenKind::Phrase(raw) => {
                let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
                if text.is_empty() {
                    return Err(ParseError::new(token.offset, "a non-empty phrase", "\"\""));
                }
                self.advance();
                let slop = match self.peek_kind() {
                    Some(&TokenKind::Tilde(Some(slop))) => {
                        self.advance();
                        slop
                    }
                    Some(TokenKind::Tilde(None)) => {
                        return Err(self.error("a slop number after '~'"));
                    }
                    _ => 0,
                };
                LeafKind::Phrase { text, slop }
            }
            TokenKind::Wildcard(pattern) => {
                self.advance();
                LeafKind::Wildcard(pattern)
            }
            TokenKind::Regex(pattern) => {
                if pattern.is_empty() {
                    return Err(ParseError::new(token.offset, "a non-empty regex", "//"));
                }
                self.advance();
                LeafKind::Regex(pattern)
            }
            TokenKind::RangeOpen { inclusive } => {
                self.advance();
                self.parse_range(inclusive)?
            }
            _ => return Err(self.error("a term")),
        };

        if let Some(TokenKind::Tilde(_)) = self.peek_kind() {
            return Err(self.error(format!("no '~' after a {} leaf", kind.name())));
        }

        Ok(kind)
    }

    /// Parses the rest of a range after its opening bracket.
    fn parse_range(&mut self, lower_inclusive: bool) -> Result<LeafKind, ParseError> {
        let lower = bound(self.parse_range_value("a lower bound")?, lower_inclusive);

        if !matches!(self.peek_kind(), Some(TokenKind::Term(word)) if word == "TO") {
            return Err(self.error("'TO'"));
        }
        self.advance();

        let upper_value = self.parse_range_value("an upper bound")?;
        let Some(&TokenKind::RangeClose { inclusive }) = self.peek_kind() else {
            return Err(self.error("']' or '}' to close the range"));
        };
        self.advance();

        Ok(LeafKind::Range {
            lower,
            upper: bound(upper_value, inclusive),
        })
    }

    /// Parses: bound → TERM | PHRASE | "*"; `None` stands for `*`.
    fn parse_range_value(&mut self, what: &str) -> Result<Option<String>, ParseError> {
        if matches!(self.peek_kind(), Some(TokenKind::Wildcard(pattern)) if pattern == "*") {
            self.advance();
            return Ok(None);
        }

        let value = match self.peek_kind() {
            Some(TokenKind::Term(value)) if value != "TO" => value.clone(),
            Some(TokenKind::Phrase(value)) => value.clone(),
            _ => return Err(self.error(what)),
        };
        self.advance();
        Ok(Some(value))
    }

    /// Parses the value after `field:>` and similar comparators.
    fn parse_comparison_value(&mut self, name: &str) -> Result<String, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Term(value) | TokenKind::Phrase(value)) => {
                let value = value.clone();
                self.advance();
                Ok(value)
            }
            _ => Err(self.error(format!("a value to compare '{name}' with"))),
        }
    }

    /// Parses a parenthesized group, consuming the surrounding parentheses.
    fn parse_group(&mut self) -> Result<QueryExpr, ParseError> {
        self.enter()?;
        self.advance(); // consume (
        let inner = self.parse_or_expr()?;

        if !self.check(&TokenKind::RParen) {
            return Err(self.error("closing parenthesis ')'"));
        }
        self.advance(); // consume )
        self.depth -= 1;

        Ok(inner)
    }

    /// Opens one level of nesting, failing at the current token past [`MAX_DEPTH`].
    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("at most {MAX_DEPTH} levels of nesting")));
        }
        self.depth += 1;
        Ok(())
    }

    /// Checks if the current token is a boost operator and applies it if so.
    fn maybe_apply_boost(&mut self, expr: QueryExpr) -> Result<QueryExpr, ParseError> {
        let Some(&TokenKind::Boost(factor)) = self.peek_kind() else {
            return Ok(expr);
        };

        if !(factor.is_finite() && factor > 0.0) {
            return Err(self.error("a positive boost factor"));
        }
        self.advance();
        Ok(QueryExpr::boost(expr, factor))
    }

    /// Builds an error pointing at the current token (or the end of input).
    fn error(&self, expected: impl Into<String>) -> ParseError {
        let found = self
            .peek_kind()
            .map_or_else(|| "end of query".to_string(), ToString::to_string);
        ParseError::new(self.current_offset(), expected, found)
    }

    /// Byte offset of the current token, or the input length at end of input.
    fn current_offset(&self) -> usize {
        self.peek().map_or(self.input_len, |t| t.offset)
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Returns the kind of the current token.
    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    /// Checks if the current token has the same kind as the given one.
    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind()
            .is_some_and(|k| mem::discriminant(k) == mem::discriminant(kind))
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Builds a range bound from an optional value and bracket kind.
fn bound(value: Option<String>, inclusive: bool) -> RangeBound {
    match value {
        None => RangeBound::Unbounded,
        Some(v) if inclusive => RangeBound::Inclusive(v),
        Some(v) => RangeBound::Exclusive(v),
    }
}

/// Parses a query string into an AST.
///
/// Returns `Ok(None)` for empty queries, `Ok(Some(expr))` for valid queries,
/// or `Err(QueryError)` for invalid syntax.
pub fn parse(input: &str) -> Result<Option<QueryExpr>, QueryError> {
    let tokens = tokenize(input).map_err(|e| QueryError::from(e).with_query(input))?;
    Parser::new(tokens, input.len())
        .parse()
        .map_err(|e| QueryError::parse(e, Some(input.to_string())))
}
