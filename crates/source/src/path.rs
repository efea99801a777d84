//! Path validation for documentation sources.
//!
//! Package names arrive from request handlers and end up in filesystem paths
//! and URLs, so they are validated before any source touches them.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a source path, ensuring it can't escape the source root (no `..`
/// traversal).
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use uniview_source::validate_path;
/// assert!(validate_path("cassandra/README.md").is_ok());
/// assert!(validate_path("a/../cassandra/README.md").is_ok()); // (never leaves root)
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(validate_path("./kafka//img/../README.md").unwrap(), Path::new("kafka/README.md"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Validates a package name used as a single path or URL segment.
///
/// ```
/// use uniview_source::validate_segment;
/// assert!(validate_segment("sysdig-cloud").is_ok());
/// assert!(validate_segment("a/b").is_err());
/// assert!(validate_segment("..").is_err());
/// ```
pub fn validate_segment(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.chars().any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control() || c.is_whitespace());
    match valid {
        true => Ok(name),
        false => exn::bail!(ErrorKind::InvalidPath(PathBuf::from(name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cassandra/README.md", "cassandra/README.md")]
    #[case("/cassandra/README.md", "cassandra/README.md")]
    #[case("cassandra/img/../README.md", "cassandra/README.md")]
    #[case("./cassandra/./README.md", "cassandra/README.md")]
    fn test_valid_paths(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("../README.md")]
    #[case("cassandra/../../README.md")]
    #[case("")]
    #[case(".")]
    #[case("a\0b")]
    fn test_invalid_paths(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[rstest]
    #[case("cassandra", true)]
    #[case("confluent-kafka", true)]
    #[case("hdfs.v2", true)]
    #[case("", false)]
    #[case("..", false)]
    #[case("a/b", false)]
    #[case("a\\b", false)]
    #[case("a b", false)]
    #[case("a?b", false)]
    #[case("%2e%2e", false)]
    fn test_segments(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_segment(name).is_ok(), valid);
    }
}
