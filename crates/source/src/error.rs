//! Source Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Every kind here is an upstream fetch
//! failure from the point of view of the catalog and documentation cache.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A source error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The requested document does not exist upstream.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Upstream answered with a non-success status code.
    #[display("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    /// Connection, TLS, timeout or body transfer failure.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Path contains invalid characters or escapes root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// The `git` executable could not be found.
    #[display("git executable not found in PATH")]
    GitNotFound,
    /// A git command exited unsuccessfully.
    #[display("git {command} failed: {stderr}")]
    Git { command: &'static str, stderr: String },
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Network(_) | Self::Io(_) | Self::Git { .. } => true,
            Self::NotFound(_) | Self::InvalidPath(_) | Self::GitNotFound => false,
        }
    }

    /// Returns `true` when upstream positively reported the document missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Status { status: 404, .. })
    }
}
