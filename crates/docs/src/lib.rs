//! Rendered documentation cache.
//!
//! Holds the HTML rendering of each package's README, loaded in bulk from a
//! documentation tree and lazily (per package, on first request) from a raw
//! document source. See [`DocCache`].

mod cache;
mod entry;
pub mod error;

pub use crate::cache::{BulkReport, DocCache};
