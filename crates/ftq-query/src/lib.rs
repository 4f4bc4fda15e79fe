//! Lexer, parser and AST for the ftq full-text query language.
//!
//! The language is Lucene-flavored:
//!
//! - **Terms**: `rust` - words that must appear
//! - **Phrases**: `"error handling"` - exact sequences, `"error handling"~2` with slop
//! - **Boolean operators**: `a AND b`, `a OR b`, `NOT a`, `-a`, and implicit AND (`a b`)
//! - **Grouping**: `(a b) OR (c d)` - precedence control
//! - **Fields**: `title:guide`, `title:(rust OR golang)` - search specific fields
//! - **Ranges**: `price:[10 TO 20}`, `price:>=10`, `date:[2020-01-01 TO *]`
//! - **Wildcards**: `rus*`, `ru?t`; **fuzzy**: `rust~1`; **regex**: `/ru[sz]t/`
//! - **Boosting**: `rust^2.5` - adjust term importance
//!
//! # Example
//!
//! ```
//! use ftq_query::parse;
//!
//! let expr = parse("title:guide (rust OR golang) -deprecated").unwrap();
//! assert!(expr.is_some());
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::{BoolOp, Leaf, LeafKind, QueryExpr, RangeBound};
pub use error::{LexError, ParseError, QueryError, QueryErrorKind};
pub use lexer::{Comparator, Token, TokenClass, TokenKind, tokenize};
pub use parser::{MAX_DEPTH, parse};
