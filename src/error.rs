//! Error types for MarkCore
//!
//! None of these abort an apply cycle. Pattern failures skip the affected
//! pass, load failures degrade to the default site configuration.

use thiserror::Error;

/// Failure to compile a token set into a matcher
#[derive(Error, Debug)]
pub enum PatternError {
    /// The generated alternation was rejected by the regex compiler
    /// (in practice: the size limit for very large word lists)
    #[error("Failed to compile pattern over {tokens} tokens: {source}")]
    Compile {
        tokens: usize,
        #[source]
        source: regex::Error,
    },
}

/// Failure talking to a key/value config backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Config could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend refused the write (quota, privacy mode, ...)
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// No storage backend is reachable from this context
    #[error("Storage unavailable")]
    Unavailable,
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Engine configuration JSON was malformed
    #[error("Invalid engine config: {0}")]
    Config(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
