//! Local filesystem documentation tree.
//!
//! Reads a directory on the local filesystem via `tokio::fs`. All paths are
//! relative to the configured root directory.

use crate::backend::TreeSource;
use crate::error::{ErrorKind, Result};
use crate::models::TreeEntry;
use crate::path::validate as validate_path;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem documentation tree.
///
/// # Examples
///
/// ```no_run
/// use uniview_source::backend::LocalTree;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tree = LocalTree::new("examples", "/srv/dcos-examples/1.8")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalTree {
    name: String,
    root: PathBuf,
}
impl LocalTree {
    /// Create a new local tree.
    ///
    /// The root does not have to exist yet (a checkout may create it later),
    /// but it must be absolute.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { name: name.into(), root })
    }

    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.display().to_string()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Recursion through async needs a boxed future.
    fn walk<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<Vec<TreeEntry>>> {
        Box::pin(async move {
            let mut entries = match fs::read_dir(dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(err) => exn::bail!(Self::map_io_error(err, dir)),
            };
            let mut tree = Vec::new();
            while let Some(entry) = entries.next_entry().await.map_err(|e| Self::map_io_error(e, dir))? {
                let path = entry.path();
                let Ok(name) = entry.file_name().into_string() else {
                    tracing::debug!(path = %path.display(), "Skipping non UTF-8 entry");
                    continue;
                };
                // Version control metadata is never documentation.
                if name.starts_with('.') {
                    continue;
                }
                let file_type = entry.file_type().await.map_err(|e| Self::map_io_error(e, &path))?;
                if file_type.is_dir() {
                    let children = self.walk(&path).await?;
                    tree.push(TreeEntry::folder(name, children));
                } else if file_type.is_file() {
                    tree.push(TreeEntry::file(name));
                }
                // Note: silently drop what is most likely a broken symlink.
            }
            tree.sort_by(|a, b| a.name.cmp(&b.name));
            Ok::<_, crate::error::Error>(tree)
        })
    }
}

#[async_trait]
impl TreeSource for LocalTree {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enumerate(&self) -> Result<Vec<TreeEntry>> {
        self.walk(&self.root).await
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryKind;

    fn populate(root: &Path) {
        std::fs::create_dir_all(root.join("cassandra/img")).unwrap();
        std::fs::write(root.join("cassandra/README.md"), "# Cassandra").unwrap();
        std::fs::write(root.join("cassandra/img/logo.png"), [0u8; 4]).unwrap();
        std::fs::create_dir_all(root.join("arangodb")).unwrap();
        std::fs::write(root.join("arangodb/README.md"), "# ArangoDB").unwrap();
        std::fs::write(root.join("LICENSE"), "MIT").unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalTree::new("name", temp_dir.path()).is_ok());
        assert!(LocalTree::new("name", "relative/path").is_err());
    }

    #[tokio::test]
    async fn test_enumerate() {
        let temp_dir = tempfile::tempdir().unwrap();
        populate(temp_dir.path());
        let tree = LocalTree::new("local", temp_dir.path()).unwrap();
        let entries = tree.enumerate().await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            names,
            vec![("LICENSE", EntryKind::File), ("arangodb", EntryKind::Folder), ("cassandra", EntryKind::Folder)]
        );
        let cassandra = &entries[2];
        assert!(cassandra.child("README.md").is_some());
        let img = cassandra.child("img").unwrap();
        assert!(img.is_folder());
        assert_eq!(img.children, vec![TreeEntry::file("logo.png")]);
    }

    #[tokio::test]
    async fn test_enumerate_missing_root_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let tree = LocalTree::new("local", temp_dir.path().join("not-cloned-yet")).unwrap();
        assert!(tree.enumerate().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        populate(temp_dir.path());
        let tree = LocalTree::new("local", temp_dir.path()).unwrap();
        let data = tree.read(Path::new("cassandra/README.md")).await.unwrap();
        assert_eq!(data, b"# Cassandra");
        let err = tree.read(Path::new("kafka/README.md")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let err = tree.read(Path::new("../../etc/passwd")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }
}
