//! In-memory package catalog.
//!
//! The catalog groups every record of the repository feed into a
//! [`PackageFamily`] per package name, keeps a listing of each family's latest
//! record sorted by name, and a full-text [`SearchIndex`] over that listing.
//! All three are rebuilt from scratch on every reload and published together
//! as a single [`Snapshot`].

mod catalog;
pub mod error;
mod family;
mod search;

pub use crate::catalog::{Catalog, Snapshot, Stats};
pub use crate::family::PackageFamily;
pub use crate::search::SearchIndex;
pub use uniview_feed::models::PackageRecord;
