//! Error types for Notefeed Core
//!
//! Nothing here is fatal to a caller of the engine. Query failures are
//! carried as values ([`Fetched::Failed`]) and degrade to "missing" or
//! zero at the call site that issued the query.

use std::path::PathBuf;

/// Failures of a single network query
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Per-call timeout elapsed before the source answered
    #[error("query timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Caller's lifecycle signal fired
    #[error("query cancelled")]
    Cancelled,

    /// Source unreachable or refused the query
    #[error("source error: {0}")]
    Source(String),

    /// Source answered with something unusable
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl QueryError {
    /// Create source error
    #[inline]
    pub fn source_error(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Check if another attempt could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Source(_))
    }

    /// Check if this is a cancellation rather than a failure
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Outcome of a guarded lookup
///
/// `Absent` means the query settled without a match; `Failed` means it
/// never settled (timeout, cancellation, source failure). Both degrade the
/// same way for display but only `Absent` is worth remembering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    /// Value found
    Found(T),
    /// Query settled, nothing matched
    Absent,
    /// Query did not settle
    Failed(QueryError),
}

impl<T> Fetched<T> {
    /// Found value, if any
    #[inline]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Absent | Self::Failed(_) => None,
        }
    }

    /// Check if a value was found
    #[inline]
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Failure, if the query did not settle
    #[inline]
    #[must_use]
    pub fn failure(&self) -> Option<&QueryError> {
        match self {
            Self::Failed(err) => Some(err),
            Self::Found(_) | Self::Absent => None,
        }
    }
}

impl<T> From<Result<Option<T>, QueryError>> for Fetched<T> {
    fn from(result: Result<Option<T>, QueryError>) -> Self {
        match result {
            Ok(Some(value)) => Self::Found(value),
            Ok(None) => Self::Absent,
            Err(err) => Self::Failed(err),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or type error
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
