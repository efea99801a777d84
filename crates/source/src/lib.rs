pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::{DocSource, FeedSource, TreeSource};
pub use crate::models::{EntryKind, TreeEntry};
pub use crate::path::{validate as validate_path, validate_segment};
use std::sync::Arc;

pub type FeedHandle = Arc<dyn FeedSource + Send + Sync>;
pub type DocHandle = Arc<dyn DocSource + Send + Sync>;
pub type TreeHandle = Arc<dyn TreeSource + Send + Sync>;
