//! Field-mapping aware rewriting of ftq queries.
//!
//! A parsed query is resolved against the index's field mappings into a canonical
//! [`Query`] tree, which is then serialized into an Elasticsearch-style wire document or
//! dumped as an indented tree:
//!
//! ```text
//! query string → parse → rewrite (mappings) → Query → { to_json, dump }
//! ```
//!
//! # Example
//!
//! ```
//! use ftq_config::{FieldMapping, FieldType, MappingSnapshot};
//! use ftq_rewrite::{QueryRewriter, RewriteOptions};
//!
//! let mappings = MappingSnapshot::from_fields([FieldMapping::new("title", FieldType::Text)]);
//! let rewriter =
//!     QueryRewriter::new("docs", &mappings, RewriteOptions::default(), "title:rust").unwrap();
//! assert_eq!(rewriter.to_json().unwrap()["match"]["title"]["query"], "rust");
//! ```

mod context;
mod dump;
mod error;
mod query;
mod rewrite;
mod serialize;

pub use context::{QueryRewriter, RewriteOptions};
pub use dump::dump;
pub use error::{Error, RewriteError, SerializationError};
pub use query::{BoolQuery, Query, ResolvedField, TypedValue};
pub use rewrite::Rewriter;
pub use serialize::{normalize, to_json};
