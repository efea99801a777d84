//! In-memory sources for testing.

use crate::backend::{DocSource, FeedSource, README, TreeSource};
use crate::error::{ErrorKind, Result};
use crate::models::TreeEntry;
use crate::path::{validate as validate_path, validate_segment};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory feed.
///
/// Holds either a document or nothing; fetching nothing fails like an
/// unreachable server would.
///
/// # Examples
///
/// ```
/// use uniview_source::backend::{FeedSource, MockFeed};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let feed = MockFeed::new(br#"{"packages": []}"#);
/// assert!(feed.fetch_feed().await.is_ok());
/// feed.fail().await;
/// assert!(feed.fetch_feed().await.is_err());
/// # }
/// ```
#[derive(Default)]
pub struct MockFeed {
    document: RwLock<Option<Vec<u8>>>,
    fetches: AtomicUsize,
}
impl MockFeed {
    pub fn new(document: impl Into<Vec<u8>>) -> Self {
        Self {
            document: RwLock::new(Some(document.into())),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Replace the document served by subsequent fetches.
    pub async fn set(&self, document: impl Into<Vec<u8>>) {
        *self.document.write().await = Some(document.into());
    }

    /// Make subsequent fetches fail.
    pub async fn fail(&self) {
        *self.document.write().await = None;
    }

    /// Number of fetches attempted so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for MockFeed {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_feed(&self) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.document
            .read()
            .await
            .clone()
            .ok_or_else(|| exn::Exn::from(ErrorKind::Network("mock feed unavailable".to_string())))
    }
}

/// In-memory per-package documentation.
pub struct MockDocs {
    base: String,
    readmes: RwLock<HashMap<String, Vec<u8>>>,
    fetches: AtomicUsize,
}
impl MockDocs {
    /// Create mock documentation pre-populated with READMEs.
    pub fn with_readmes(readmes: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>) -> Self {
        Self {
            base: "https://raw.example.com/examples".to_string(),
            readmes: RwLock::new(readmes.into_iter().map(|(name, data)| (name.into(), data.into())).collect()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub async fn insert(&self, package: impl Into<String>, readme: impl Into<Vec<u8>>) {
        self.readmes.write().await.insert(package.into(), readme.into());
    }

    pub async fn remove(&self, package: &str) {
        self.readmes.write().await.remove(package);
    }

    /// Number of fetches attempted so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}
impl Default for MockDocs {
    fn default() -> Self {
        let readmes: [(&str, &str); 0] = [];
        Self::with_readmes(readmes)
    }
}

#[async_trait]
impl DocSource for MockDocs {
    fn name(&self) -> &str {
        "mock"
    }

    fn base_url(&self, package: &str) -> String {
        format!("{}/{package}", self.base)
    }

    async fn fetch_readme(&self, package: &str) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let package = validate_segment(package)?;
        self.readmes
            .read()
            .await
            .get(package)
            .cloned()
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(format!("{package}/{README}"))))
    }
}

/// In-memory documentation tree, built from a flat list of file paths.
pub struct MockTree {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    syncs: AtomicUsize,
    fail_sync: std::sync::atomic::AtomicBool,
}
impl MockTree {
    /// Create a mock tree pre-populated with files.
    ///
    /// Panics if any path fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = BTreeMap::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockTree::with_files: invalid path {}", path.display());
            };
            map.insert(validated, data.into());
        }
        Self {
            files: RwLock::new(map),
            syncs: AtomicUsize::new(0),
            fail_sync: Default::default(),
        }
    }

    pub async fn write(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> Result<()> {
        let path = validate_path(path)?;
        self.files.write().await.insert(path, data.into());
        Ok(())
    }

    /// Remove every file below `prefix`.
    pub async fn remove(&self, prefix: impl AsRef<Path>) {
        self.files.write().await.retain(|path, _| !path.starts_with(prefix.as_ref()));
    }

    /// Make subsequent syncs fail (or succeed again).
    pub fn fail_sync(&self, fail: bool) {
        self.fail_sync.store(fail, Ordering::SeqCst);
    }

    /// Number of syncs attempted so far.
    pub fn syncs(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }
}
impl Default for MockTree {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

fn insert_path(entries: &mut Vec<TreeEntry>, components: &[String]) {
    let Some((head, rest)) = components.split_first() else {
        return;
    };
    if rest.is_empty() {
        if !entries.iter().any(|e| &e.name == head) {
            entries.push(TreeEntry::file(head.clone()));
        }
        return;
    }
    let position = match entries.iter().position(|e| &e.name == head) {
        Some(position) => position,
        None => {
            entries.push(TreeEntry::folder(head.clone(), Vec::new()));
            entries.len() - 1
        },
    };
    insert_path(&mut entries[position].children, rest);
}

#[async_trait]
impl TreeSource for MockTree {
    fn name(&self) -> &str {
        "mock"
    }

    async fn sync(&self) -> Result<()> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sync.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Git {
                command: "pull",
                stderr: "mock sync failure".to_string(),
            });
        }
        Ok(())
    }

    async fn enumerate(&self) -> Result<Vec<TreeEntry>> {
        let mut entries = Vec::new();
        // BTreeMap iteration keeps siblings sorted by name.
        for path in self.files.read().await.keys() {
            let components: Vec<String> = path.iter().map(|c| c.to_string_lossy().into_owned()).collect();
            insert_path(&mut entries, &components);
        }
        Ok(entries)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        self.files
            .read()
            .await
            .get(&path)
            .cloned()
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.display().to_string())))
    }
}
