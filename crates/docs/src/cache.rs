use crate::entry::{DocEntry, RefreshHandle};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::instrument;
use uniview_render::RenderHandle;
use uniview_source::backend::README;
use uniview_source::{DocHandle, TreeHandle};

/// Outcome of a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkReport {
    /// Packages rendered and stored.
    pub loaded: usize,
    /// Package folders without a readable README.
    pub skipped: usize,
    /// Packages left alone because they already have a lazily fetched entry.
    pub kept: usize,
}

struct Inner {
    entries: RwLock<HashMap<String, DocEntry>>,
    docs: DocHandle,
    renderer: RenderHandle,
    refresh_interval: Duration,
}
impl Inner {
    /// Fetch and render one package, `None` if it has no documentation.
    async fn fetch(&self, package: &str) -> Option<Arc<str>> {
        match self.docs.fetch_readme(package).await {
            Ok(bytes) => Some(self.render(package, &bytes)),
            Err(err) if err.is_not_found() => {
                tracing::debug!(package, source = self.docs.name(), "No documentation upstream");
                None
            },
            Err(err) => {
                tracing::warn!(package, source = self.docs.name(), error = ?err, "Documentation fetch failed");
                None
            },
        }
    }

    fn render(&self, package: &str, markdown: &[u8]) -> Arc<str> {
        let markdown = String::from_utf8_lossy(markdown);
        self.renderer.render_with_base(&markdown, &self.docs.base_url(package)).into()
    }

    /// Periodic refresh of a lazily fetched entry. Failures keep whatever the
    /// entry held before.
    async fn refresh(&self, key: &str, package: &str) {
        let Ok(bytes) = self.docs.fetch_readme(package).await.inspect_err(|err| {
            tracing::debug!(package, error = ?err, "Documentation refresh failed, keeping previous entry");
        }) else {
            return;
        };
        let html = self.render(package, &bytes);
        let mut entries = self.entries.write();
        // Evicted (or replaced by a bulk load) while fetching.
        if let Some(entry) = entries.get_mut(key).filter(|entry| entry.is_lazy()) {
            entry.html = Some(html);
            tracing::trace!(package, "Refreshed documentation");
        }
    }
}

fn arm_refresh(inner: Weak<Inner>, period: Duration, key: String, package: String) -> RefreshHandle {
    RefreshHandle::new(tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            // The cache is gone; nothing left to refresh.
            let Some(inner) = inner.upgrade() else {
                return;
            };
            inner.refresh(&key, &package).await;
        }
    }))
}

/// Rendered documentation per package.
///
/// Entries are keyed by lower-cased package name. They are either loaded in
/// bulk from a documentation tree ([`bulk_replace`](Self::bulk_replace)) or
/// fetched one at a time on first request ([`get`](Self::get)). Lazily fetched
/// entries, including negative ones, re-fetch themselves on a fixed interval
/// until they are evicted or the cache is dropped.
///
/// Cloning is cheap and clones share the same entries.
#[derive(Clone)]
pub struct DocCache {
    inner: Arc<Inner>,
}
impl DocCache {
    pub fn new(docs: DocHandle, renderer: RenderHandle, refresh_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                docs,
                renderer,
                refresh_interval,
            }),
        }
    }

    /// Replace every bulk-loaded entry with the packages found in `tree`.
    ///
    /// Each top-level folder is a package whose `README.md` is rendered with
    /// its relative images pointed at the package's raw URL. Lazily fetched
    /// entries are left untouched. If the tree cannot be enumerated the cache
    /// is not modified.
    #[instrument(skip_all, fields(source = tree.name()))]
    pub async fn bulk_replace(&self, tree: &TreeHandle) -> Result<BulkReport> {
        let folders = tree.enumerate().await.or_raise(|| ErrorKind::Enumerate)?;
        let mut report = BulkReport::default();
        let mut loaded = HashMap::new();
        for folder in folders.iter().filter(|entry| entry.is_folder()) {
            let path = Path::new(&folder.name).join(README);
            match tree.read(&path).await {
                Ok(bytes) => {
                    let html = self.inner.render(&folder.name, &bytes);
                    loaded.insert(folder.name.to_lowercase(), html);
                },
                Err(err) => {
                    tracing::warn!(package = %folder.name, error = ?err, "Skipping documentation folder");
                    report.skipped += 1;
                },
            }
        }

        let mut entries = self.inner.entries.write();
        entries.retain(|_, entry| entry.is_lazy());
        for (key, html) in loaded {
            if entries.contains_key(&key) {
                report.kept += 1;
                continue;
            }
            entries.insert(key, DocEntry::bulk(html));
            report.loaded += 1;
        }
        Ok(report)
    }

    /// Rendered documentation for `name`.
    ///
    /// Returns `None` for packages known to have no documentation. A package
    /// without any entry is fetched right away; whatever the outcome, the
    /// result is stored and a refresh task is started for it.
    pub async fn get(&self, name: &str) -> Option<Arc<str>> {
        let key = name.to_lowercase();
        let cached = self.inner.entries.read().get(&key).map(|entry| entry.html.clone());
        if let Some(html) = cached {
            return html;
        }
        let html = self.inner.fetch(name).await;
        let refresh = arm_refresh(Arc::downgrade(&self.inner), self.inner.refresh_interval, key.clone(), name.to_string());
        tracing::debug!(package = name, available = html.is_some(), "Cached documentation on demand");
        // Concurrent misses for the same package: last write wins, and the
        // replaced entry's refresh task is cancelled with it.
        self.inner.entries.write().insert(key, DocEntry::lazy(html.clone(), refresh));
        html
    }

    /// Whether rendered documentation is currently cached for `name`.
    pub fn has_example(&self, name: &str) -> bool {
        self.inner.entries.read().get(&name.to_lowercase()).is_some_and(DocEntry::enabled)
    }

    /// Drop the entry for `name`, cancelling its refresh task if it has one.
    pub fn evict(&self, name: &str) -> bool {
        self.inner.entries.write().remove(&name.to_lowercase()).is_some()
    }

    /// Evict every lazily fetched entry whose lower-cased name `keep`
    /// rejects, cancelling its refresh task. Returns how many were evicted.
    pub fn retain_lazy(&self, keep: impl Fn(&str) -> bool) -> usize {
        let mut entries = self.inner.entries.write();
        let before = entries.len();
        entries.retain(|key, entry| !entry.is_lazy() || keep(key));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }
}
impl std::fmt::Debug for DocCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocCache")
            .field("entries", &self.len())
            .field("refresh_interval", &self.inner.refresh_interval)
            .finish_non_exhaustive()
    }
}
