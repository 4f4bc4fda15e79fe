//! Query lexer (tokenizer).
//!
//! Converts a query string into a stream of tokens for the parser.

use std::{fmt, iter::Peekable, str::Chars};

use log::trace;

use crate::error::LexError;

/// Comparison operator of a `field:>value` style range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
}

/// Broad lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Bare words and field names.
    Identifier,
    /// Boolean keywords, negation, comparators and suffix operators.
    Operator,
    /// Quoted phrases, patterns and regexes.
    Literal,
    /// Parentheses and range brackets.
    Punctuation,
}

/// The kind of a token in the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A bare word (search term), with escapes resolved.
    Term(String),

    /// A bare word containing unescaped `*` or `?`; escapes are kept in the pattern.
    Wildcard(String),

    /// A quoted phrase (the quotes are stripped, content preserved).
    Phrase(String),

    /// A `/regex/` literal (the slashes are stripped).
    Regex(String),

    /// Field prefix (e.g., "title:" produces FieldPrefix("title")).
    FieldPrefix(String),

    /// Comparison operator following a field prefix.
    Comparator(Comparator),

    /// The AND keyword.
    And,

    /// The OR keyword.
    Or,

    /// The NOT keyword or a negation prefix (-).
    Not,

    /// Left parenthesis.
    LParen,

    /// Right parenthesis.
    RParen,

    /// `[` (inclusive) or `{` (exclusive).
    RangeOpen {
        /// Whether the bound is inclusive.
        inclusive: bool,
    },

    /// `]` (inclusive) or `}` (exclusive).
    RangeClose {
        /// Whether the bound is inclusive.
        inclusive: bool,
    },

    /// Boost operator with factor (e.g., "^2.5" produces Boost(2.5)).
    Boost(f32),

    /// Fuzzy or slop operator with optional number (e.g., "~2").
    Tilde(Option<u32>),
}

impl TokenKind {
    /// Returns the lexical category of this token kind.
    pub fn class(&self) -> TokenClass {
        match self {
            Self::Term(_) | Self::FieldPrefix(_) => TokenClass::Identifier,
            Self::Wildcard(_) | Self::Phrase(_) | Self::Regex(_) => TokenClass::Literal,
            Self::Comparator(_)
            | Self::And
            | Self::Or
            | Self::Not
            | Self::Boost(_)
            | Self::Tilde(_) => TokenClass::Operator,
            Self::LParen | Self::RParen | Self::RangeOpen { .. } | Self::RangeClose { .. } => {
                TokenClass::Punctuation
            }
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(s) => write!(f, "term '{s}'"),
            Self::Wildcard(s) => write!(f, "wildcard '{s}'"),
            Self::Phrase(s) => write!(f, "phrase \"{s}\""),
            Self::Regex(s) => write!(f, "regex /{s}/"),
            Self::FieldPrefix(s) => write!(f, "field '{s}:'"),
            Self::Comparator(c) => {
                let op = match c {
                    Comparator::Gt => ">",
                    Comparator::Gte => ">=",
                    Comparator::Lt => "<",
                    Comparator::Lte => "<=",
                };
                write!(f, "'{op}'")
            }
            Self::And => f.write_str("AND"),
            Self::Or => f.write_str("OR"),
            Self::Not => f.write_str("NOT"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::RangeOpen { inclusive: true } => f.write_str("'['"),
            Self::RangeOpen { inclusive: false } => f.write_str("'{'"),
            Self::RangeClose { inclusive: true } => f.write_str("']'"),
            Self::RangeClose { inclusive: false } => f.write_str("'}'"),
            Self::Boost(b) => write!(f, "boost '^{b}'"),
            Self::Tilde(Some(n)) => write!(f, "'~{n}'"),
            Self::Tilde(None) => f.write_str("'~'"),
        }
    }
}

/// A lexical unit: its kind, the raw source text, and where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What the token is.
    pub kind: TokenKind,
    /// The raw source slice the token was read from.
    pub text: String,
    /// Byte offset of the token's first character.
    pub offset: usize,
}

/// Characters that end a bare word.
const WORD_BREAKS: &[char] = &['(', ')', '"', '^', '~', '[', ']', '{', '}'];

/// Tokenizes a query string.
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input.
    position: usize,
    /// Inside `[ … ]`: `-` and `:` are word characters.
    in_range: bool,
    /// Kind of the previously emitted token.
    previous: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            in_range: false,
            previous: None,
        }
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            self.previous = Some(token.kind.clone());
            tokens.push(token);
        }

        trace!("tokenized {:?} into {} tokens", self.input, tokens.len());
        Ok(tokens)
    }

    /// Returns the next token, or None if at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        let start = self.position;
        let kind = match ch {
            '"' => self.read_phrase()?,
            '/' => self.read_regex()?,
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' | '{' => {
                self.in_range = true;
                self.single(TokenKind::RangeOpen {
                    inclusive: ch == '[',
                })
            }
            ']' | '}' => {
                self.in_range = false;
                self.single(TokenKind::RangeClose {
                    inclusive: ch == ']',
                })
            }
            '-' if !self.in_range && !self.after_comparator() => self.single(TokenKind::Not),
            '^' => self.read_boost()?,
            '~' => self.read_tilde()?,
            '>' | '<' if self.after_field_prefix() => self.read_comparator(),
            _ => self.read_word()?,
        };

        Ok(Some(Token {
            kind,
            text: self.input[start..self.position].to_string(),
            offset: start,
        }))
    }

    /// Consumes one character and returns the given kind.
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// True if the previous token was a field prefix.
    fn after_field_prefix(&self) -> bool {
        matches!(self.previous, Some(TokenKind::FieldPrefix(_)))
    }

    /// True if the previous token was a comparator.
    fn after_comparator(&self) -> bool {
        matches!(self.previous, Some(TokenKind::Comparator(_)))
    }

    /// Reads a quoted phrase.
    fn read_phrase(&mut self) -> Result<TokenKind, LexError> {
        let start_pos = self.position;
        self.advance(); // consume opening quote

        let mut content = String::new();

        loop {
            match self.chars.peek() {
                Some(&'"') => {
                    self.advance(); // consume closing quote
                    return Ok(TokenKind::Phrase(content));
                }
                Some(&'\\') => {
                    let escape_pos = self.position;
                    self.advance();
                    match self.chars.peek() {
                        Some(&c) if c == '"' || c == '\\' => {
                            content.push(c);
                            self.advance();
                        }
                        Some(&c) => {
                            return Err(LexError::new(
                                format!("invalid escape sequence '\\{c}' in phrase"),
                                escape_pos,
                            ));
                        }
                        None => return Err(LexError::new("unclosed quote", start_pos)),
                    }
                }
                Some(&ch) => {
                    content.push(ch);
                    self.advance();
                }
                None => return Err(LexError::new("unclosed quote", start_pos)),
            }
        }
    }

    /// Reads a `/regex/` literal. `\/` stands for a slash; other escapes pass through.
    fn read_regex(&mut self) -> Result<TokenKind, LexError> {
        let start_pos = self.position;
        self.advance(); // consume opening slash

        let mut pattern = String::new();

        loop {
            match self.chars.next() {
                Some('/') => {
                    self.position += 1;
                    return Ok(TokenKind::Regex(pattern));
                }
                Some('\\') => {
                    self.position += 1;
                    let Some(c) = self.chars.next() else {
                        break;
                    };
                    self.position += c.len_utf8();
                    if c != '/' {
                        pattern.push('\\');
                    }
                    pattern.push(c);
                }
                Some(c) => {
                    pattern.push(c);
                    self.position += c.len_utf8();
                }
                None => break,
            }
        }

        Err(LexError::new("unterminated regex", start_pos))
    }

    /// Reads a term, wildcard, keyword (AND, OR, NOT), or field prefix.
    fn read_word(&mut self) -> Result<TokenKind, LexError> {
        // `text` has escapes resolved; `pattern` keeps them for wildcard use.
        let mut text = String::new();
        let mut pattern = String::new();
        let mut escaped = false;
        let mut wildcard = false;

        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || WORD_BREAKS.contains(&ch) {
                break;
            }

            match ch {
                '\\' => {
                    let escape_pos = self.position;
                    self.advance();
                    let Some(&next) = self.chars.peek() else {
                        return Err(LexError::new("incomplete escape sequence", escape_pos));
                    };
                    text.push(next);
                    pattern.push('\\');
                    pattern.push(next);
                    escaped = true;
                    self.advance();
                }
                ':' if !text.is_empty() && !self.in_range => {
                    self.advance(); // consume the colon
                    return Ok(TokenKind::FieldPrefix(text));
                }
                '*' | '?' => {
                    wildcard = true;
                    text.push(ch);
                    pattern.push(ch);
                    self.advance();
                }
                _ => {
                    text.push(ch);
                    pattern.push(ch);
                    self.advance();
                }
            }
        }

        if wildcard {
            return Ok(TokenKind::Wildcard(pattern));
        }

        if !escaped && !self.in_range {
            if text.eq_ignore_ascii_case("OR") {
                return Ok(TokenKind::Or);
            }
            if text.eq_ignore_ascii_case("AND") {
                return Ok(TokenKind::And);
            }
            if text.eq_ignore_ascii_case("NOT") {
                return Ok(TokenKind::Not);
            }
        }

        Ok(TokenKind::Term(text))
    }

    /// Reads a boost operator (^N or ^N.N).
    fn read_boost(&mut self) -> Result<TokenKind, LexError> {
        let start_pos = self.position;
        self.advance(); // consume '^'

        let number = self.read_number(true);

        if number.is_empty() {
            return Err(LexError::new("expected number after '^'", start_pos));
        }

        number
            .parse::<f32>()
            .map(TokenKind::Boost)
            .map_err(|_| LexError::new(format!("invalid boost value: {number}"), start_pos))
    }

    /// Reads a fuzzy/slop operator (~ or ~N).
    fn read_tilde(&mut self) -> Result<TokenKind, LexError> {
        let start_pos = self.position;
        self.advance(); // consume '~'

        let number = self.read_number(false);
        if number.is_empty() {
            return Ok(TokenKind::Tilde(None));
        }

        number
            .parse::<u32>()
            .map(|n| TokenKind::Tilde(Some(n)))
            .map_err(|_| LexError::new(format!("invalid distance after '~': {number}"), start_pos))
    }

    /// Reads a comparison operator after a field prefix.
    fn read_comparator(&mut self) -> TokenKind {
        let greater = self.chars.peek() == Some(&'>');
        self.advance();
        let inclusive = self.chars.peek() == Some(&'=');
        if inclusive {
            self.advance();
        }
        TokenKind::Comparator(match (greater, inclusive) {
            (true, false) => Comparator::Gt,
            (true, true) => Comparator::Gte,
            (false, false) => Comparator::Lt,
            (false, true) => Comparator::Lte,
        })
    }

    /// Reads ASCII digits, optionally with a single decimal point.
    fn read_number(&mut self, allow_decimal: bool) -> String {
        let mut number = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() || (allow_decimal && ch == '.' && !number.contains('.')) {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        number
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Tokenizes a query string.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}
