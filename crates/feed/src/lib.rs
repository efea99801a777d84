//! Repository feed parsing and normalization.
//!
//! The feed is a single JSON document (`{"packages": [...]}`) listing every
//! version of every package. [`Feed::parse`] validates the document shape and
//! deserializes each record independently, so one broken record never takes
//! the rest of the feed down with it. [`Normalizer`] then reduces each
//! [`RawPackage`](models::RawPackage) to a [`PackageRecord`](models::PackageRecord).

pub mod error;
pub mod models;
mod normalize;

use crate::error::{ErrorKind, Result};
use crate::models::RawPackage;
pub use crate::normalize::Normalizer;
use exn::ResultExt;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

#[derive(Deserialize)]
struct Document {
    packages: Vec<Value>,
}

/// A parsed repository feed, in feed order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feed {
    pub packages: Vec<RawPackage>,
    /// Records that were dropped because a required field was missing or
    /// unusable.
    pub skipped: usize,
}
impl Feed {
    /// Parse raw feed bytes.
    ///
    /// Fails only when the payload as a whole is unusable; individual records
    /// without a usable `name`, `version` or `releaseVersion` are skipped and
    /// counted in [`skipped`](Self::skipped).
    #[instrument(skip(bytes), fields(bytes = bytes.as_ref().len()))]
    pub fn parse(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let document: Document = serde_json::from_slice(bytes.as_ref()).or_raise(|| ErrorKind::MalformedFeed)?;
        let mut feed = Feed {
            packages: Vec::with_capacity(document.packages.len()),
            skipped: 0,
        };
        for (position, value) in document.packages.into_iter().enumerate() {
            match serde_json::from_value::<RawPackage>(value) {
                Ok(package) => feed.packages.push(package),
                Err(err) => {
                    tracing::warn!(position, error = %err, "Skipping unusable feed record");
                    feed.skipped += 1;
                },
            }
        }
        Ok(feed)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
impl FromIterator<RawPackage> for Feed {
    fn from_iter<I: IntoIterator<Item = RawPackage>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().collect(),
            skipped: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_feed_in_order() {
        let feed = Feed::parse(
            br#"{"packages": [
                {"name": "cassandra", "version": "2.1", "releaseVersion": 3},
                {"name": "cassandra", "version": "2.2", "releaseVersion": 5},
                {"name": "arangodb", "version": "0.3", "releaseVersion": 1}
            ]}"#,
        )
        .unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.skipped, 0);
        let names: Vec<_> = feed.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["cassandra", "cassandra", "arangodb"]);
    }

    #[test]
    fn test_parse_skips_broken_records() {
        let feed = Feed::parse(
            br#"{"packages": [
                {"name": "cassandra", "version": "2.1", "releaseVersion": 3},
                {"name": "broken"},
                "not even an object"
            ]}"#,
        )
        .unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.skipped, 2);
    }

    #[rstest]
    #[case(b"".as_slice())]
    #[case(b"<html>502 Bad Gateway</html>".as_slice())]
    #[case(br#"{"repositories": []}"#.as_slice())]
    #[case(br#"{"packages": {}}"#.as_slice())]
    fn test_parse_malformed(#[case] bytes: &[u8]) {
        let err = Feed::parse(bytes).unwrap_err();
        assert_eq!(*err, ErrorKind::MalformedFeed);
    }

    #[test]
    fn test_empty_feed_is_valid() {
        let feed = Feed::parse(br#"{"packages": []}"#).unwrap();
        assert!(feed.is_empty());
    }
}
