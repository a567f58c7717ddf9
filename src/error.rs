//! Error types for configuration loading and admin mutations.
//!
//! Matching itself never produces an error: a request that matches no stub
//! resolves to [`Resolution::NoMatch`](crate::engine::Resolution), which is a
//! value, not a failure.

use std::path::PathBuf;
use thiserror::Error;

/// A contract was malformed and rejected before entering the repository.
///
/// On any of these the previously loaded collection stays authoritative.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A url, header or post predicate failed to compile as a regex.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A sequenced response was declared with zero entries.
    #[error("response sequence is empty")]
    EmptySequence,

    /// Status code outside 100..=599.
    #[error("invalid status code: {0}")]
    InvalidStatus(u16),

    /// Builder finalized without a url predicate.
    #[error("stub request has no url predicate")]
    MissingUrl,

    /// Builder given both single-response fields and sequence entries.
    #[error("stub declares both a single response and a response sequence")]
    AmbiguousResponse,

    /// Wraps the failing declaration's position in the config file.
    #[error("stub {index}: {source}")]
    Declaration {
        index: usize,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Attach the declaration index a load-time error belongs to.
    pub(crate) fn at_index(self, index: usize) -> Self {
        ConfigError::Declaration {
            index,
            source: Box::new(self),
        }
    }
}

/// An admin mutation targeted a record that no longer exists, e.g. because a
/// concurrent reload shrank the collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("stub index {index} out of range (repository holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
