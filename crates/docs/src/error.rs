//! Documentation Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A documentation cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for documentation cache operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The documentation tree could not be listed; the cache was left as is.
    #[display("could not enumerate documentation tree")]
    Enumerate,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Enumerate => true,
        }
    }
}
