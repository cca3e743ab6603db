//! Segmentation error types
//!
//! These are configuration errors, reported when an engine or pipeline is
//! built. Failures while a stream is running are
//! [`StreamError`](rill_core::StreamError)s from upstream and are forwarded
//! unchanged.

use thiserror::Error;

/// Errors raised while building segmentation engines
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// A label engine needs at least one label
    #[error("label set is empty")]
    EmptyLabelSet,

    /// Unnamed labels would be indistinguishable from unlabeled text
    #[error("label at position {index} has no name")]
    UnnamedLabel {
        /// Position of the label in the supplied list
        index: usize,
    },

    /// A special-token engine needs at least one token
    #[error("special token list is empty")]
    EmptyTokenSet,

    /// Special tokens must be non-empty
    #[error("special token at position {index} is empty")]
    EmptyToken {
        /// Position of the token in the supplied list
        index: usize,
    },

    /// Chunk size must be at least one byte
    #[error("invalid chunk size: {size}")]
    InvalidChunkSize {
        /// The rejected size
        size: usize,
    },

    /// Configuration file could not be read
    #[error("failed to read config '{path}': {reason}")]
    ConfigRead {
        /// Path of the configuration file
        path: String,
        /// Underlying I/O error
        reason: String,
    },

    /// Configuration could not be parsed
    #[error("failed to parse config '{path}': {reason}")]
    ConfigParse {
        /// Path of the configuration file, or `<inline>`
        path: String,
        /// Underlying TOML error
        reason: String,
    },

    /// Configuration is well-formed but inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for segmentation setup
pub type Result<T> = std::result::Result<T, SegmentError>;
