//! Application Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Nothing here is fatal to a running
//! scheduler: refresh failures are reported and the previous state is kept.

use derive_more::{Display, Error};

/// An application error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Configuration could not be loaded, or sources could not be built from it.
    #[display("invalid configuration")]
    Config,
    /// The repository feed could not be fetched.
    #[display("could not fetch repository feed")]
    Fetch,
    /// The repository feed was fetched but is not a usable document.
    #[display("could not parse repository feed")]
    Parse,
    /// A new catalog snapshot could not be built.
    #[display("could not publish catalog")]
    Publish,
    /// The documentation tree could not be brought up to date.
    #[display("could not sync documentation tree")]
    Sync,
    /// The documentation tree could not be loaded into the cache.
    #[display("could not load documentation")]
    Docs,
    /// Command output could not be produced.
    #[display("could not write output")]
    Output,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch | Self::Parse | Self::Publish | Self::Sync | Self::Docs => true,
            Self::Config | Self::Output => false,
        }
    }
}
