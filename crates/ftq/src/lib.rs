//! ftq: full-text query rewriter.
//!
//! Rewrites query strings in a Lucene-like syntax into the structured query documents an
//! Elasticsearch-style engine consumes, resolving field names through the index's field
//! mappings. Configuration lives in `.ftq.toml` files; the binary's subcommands are
//! defined under [`cli`].

pub mod cli;
