//! Error types for ftq configuration.

use std::{io, path::PathBuf};

use thiserror::Error;
use toml::{de, ser};

/// Errors that can occur when loading or processing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration or mapping file.
    #[error("failed to read {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// Failed to render the effective configuration as TOML.
    #[error("failed to serialize configuration: {source}")]
    SerializeToml {
        /// Underlying TOML serialization error.
        #[from]
        source: ser::Error,
    },

    /// A mapping file is not valid JSON.
    #[error("failed to parse mapping file {path}: {source}")]
    ParseMapping {
        /// Path to the mapping file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A mapping document is valid JSON but not a usable field mapping.
    #[error("invalid mapping: {reason}")]
    InvalidMapping {
        /// What is wrong with the document.
        reason: String,
    },

    /// A `[fields.NAME]` table is unusable.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the field.
        field: String,
        /// What is wrong with the definition.
        reason: String,
    },

    /// The configured mapping path is not a regular file.
    #[error("mapping path is not a file: {path}")]
    MappingNotFile {
        /// The offending path.
        path: PathBuf,
    },

    /// Failed to determine home directory.
    #[error("could not determine home directory")]
    NoHomeDirectory,

    /// Failed to canonicalize a path.
    #[error("failed to resolve path {path}: {source}")]
    PathResolution {
        /// The path that could not be resolved.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}
