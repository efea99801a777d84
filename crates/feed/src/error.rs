//! Feed Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A feed error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The payload is not a repository document at all (not JSON, or no
    /// `packages` array). Individual broken records are skipped instead.
    #[display("malformed repository feed")]
    MalformedFeed,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Upstream may publish a fixed document on the next cycle, but
        // retrying the same bytes never helps.
        false
    }
}
