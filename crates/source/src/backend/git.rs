//! Documentation tree backed by a git checkout.

use crate::backend::{LocalTree, TreeSource};
use crate::error::{ErrorKind, Result};
use crate::models::TreeEntry;
use async_trait::async_trait;
use exn::ResultExt;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::instrument;

/// A [`LocalTree`] that lives inside a git checkout.
///
/// [`sync`](TreeSource::sync) clones the repository when the checkout does
/// not exist yet, and fast-forward pulls it otherwise. A failed pull leaves
/// the existing checkout (and therefore the previously enumerated tree)
/// untouched.
#[derive(Debug, Clone)]
pub struct GitCheckout {
    git: PathBuf,
    repository: String,
    branch: String,
    checkout: PathBuf,
    tree: LocalTree,
}
impl GitCheckout {
    /// Create a checkout of `repository` at `checkout`, exposing the
    /// `subdirectory` of the repository as the documentation tree.
    pub fn new(
        name: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
        checkout: impl Into<PathBuf>,
        subdirectory: impl AsRef<Path>,
    ) -> Result<Self> {
        let Ok(git) = which::which("git") else {
            exn::bail!(ErrorKind::GitNotFound);
        };
        let checkout = checkout.into();
        let tree = LocalTree::new(name, checkout.join(subdirectory))?;
        Ok(Self {
            git,
            repository: repository.into(),
            branch: branch.into(),
            checkout,
            tree,
        })
    }

    async fn run<I, S>(&self, command: &'static str, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.git)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .or_raise(|| ErrorKind::Git {
                command,
                stderr: "could not spawn git".to_string(),
            })?;
        if !output.status.success() {
            exn::bail!(ErrorKind::Git {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TreeSource for GitCheckout {
    fn name(&self) -> &str {
        self.tree.name()
    }

    #[instrument(skip(self), fields(repository = %self.repository, checkout = %self.checkout.display()))]
    async fn sync(&self) -> Result<()> {
        let branch = OsStr::new(&self.branch);
        if self.checkout.join(".git").is_dir() {
            let args = [OsStr::new("-C"), self.checkout.as_os_str(), OsStr::new("pull"), OsStr::new("--ff-only"), OsStr::new("origin"), branch];
            self.run("pull", args).await?;
            tracing::info!("Pulled documentation repository");
        } else {
            if let Some(parent) = self.checkout.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(ErrorKind::Io)?;
            }
            let args = [
                OsStr::new("clone"),
                OsStr::new("--depth"),
                OsStr::new("1"),
                OsStr::new("--branch"),
                branch,
                OsStr::new(&self.repository),
                self.checkout.as_os_str(),
            ];
            self.run("clone", args).await?;
            tracing::info!("Cloned documentation repository");
        }
        Ok(())
    }

    async fn enumerate(&self) -> Result<Vec<TreeEntry>> {
        self.tree.enumerate().await
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.tree.read(path).await
    }
}
