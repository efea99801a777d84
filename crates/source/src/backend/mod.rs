//! Source traits and implementations.
//!
//! Everything that crosses the network or touches the disk on behalf of the
//! catalog and documentation cache goes through one of three traits:
//!
//! - [`FeedSource`]: the full repository feed document.
//! - [`DocSource`]: a single package's documentation, fetched on demand.
//! - [`TreeSource`]: an enumerable documentation tree used for bulk loads.
//!

#[cfg(feature = "git")]
mod git;
#[cfg(feature = "http")]
mod http;
mod local;
#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "git")]
pub use self::git::GitCheckout;
#[cfg(feature = "http")]
pub use self::http::{HttpDocs, HttpFeed};
pub use self::local::LocalTree;
#[cfg(feature = "mock")]
pub use self::mock::{MockDocs, MockFeed, MockTree};
use crate::error::Result;
use crate::models::TreeEntry;
use async_trait::async_trait;
use std::path::Path;

/// Name of the documentation file inside each package folder.
pub const README: &str = "README.md";

/// Provides the raw bytes of the repository feed.
///
/// # Examples
///
/// ```
/// use uniview_source::{backend::FeedSource, error::Result};
///
/// async fn feed_size(source: &dyn FeedSource) -> Result<usize> {
///     Ok(source.fetch_feed().await?.len())
/// }
/// ```
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Name of the source, used for logging only.
    fn name(&self) -> &str;

    /// Fetch the complete current feed document.
    ///
    /// Any failure (unreachable, non-2xx, truncated body) is an error; the
    /// caller decides whether to keep serving stale data.
    async fn fetch_feed(&self) -> Result<Vec<u8>>;
}

/// Provides one package's documentation on demand.
#[async_trait]
pub trait DocSource: Send + Sync {
    /// Name of the source, used for logging only.
    fn name(&self) -> &str;

    /// Absolute URL that relative references inside the package's
    /// documentation resolve against (no trailing slash).
    fn base_url(&self, package: &str) -> String;

    /// Fetch the markdown README of `package`.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if upstream has
    /// no documentation for the package.
    async fn fetch_readme(&self, package: &str) -> Result<Vec<u8>>;
}

/// An enumerable documentation tree with one folder per package.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use uniview_source::{backend::TreeSource, error::Result};
///
/// async fn package_folders(tree: &dyn TreeSource) -> Result<Vec<String>> {
///     tree.sync().await?;
///     let entries = tree.enumerate().await?;
///     Ok(entries.into_iter().filter(|e| e.is_folder()).map(|e| e.name).collect())
/// }
/// ```
#[async_trait]
pub trait TreeSource: Send + Sync {
    /// Name of the source, used for logging only.
    fn name(&self) -> &str;

    /// Bring the tree up to date with its origin (clone, pull, ...).
    ///
    /// Default implementation does nothing, for trees that are always
    /// current.
    async fn sync(&self) -> Result<()> {
        Ok(())
    }

    /// List the top-level entries of the tree, with folders recursively
    /// populated. A tree whose root doesn't exist yet is empty, not an error.
    async fn enumerate(&self) -> Result<Vec<TreeEntry>>;

    /// Read a file relative to the tree root.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}
