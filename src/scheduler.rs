use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::instrument;
use uniview_catalog::{Catalog, Stats};
use uniview_docs::{BulkReport, DocCache};
use uniview_feed::{Feed, Normalizer};
use uniview_source::{FeedHandle, TreeHandle};

/// Drives the two periodic reloads: the catalog from the repository feed, and
/// the documentation cache from the documentation tree.
///
/// Both reloads are full replacements. A failed reload is reported and leaves
/// the previous catalog or cache in place until the next cycle.
pub struct Scheduler {
    catalog: Arc<Catalog>,
    docs: DocCache,
    feed: FeedHandle,
    tree: TreeHandle,
    normalizer: Normalizer,
    catalog_interval: Duration,
    docs_interval: Duration,
}
impl Scheduler {
    pub fn new(catalog: Arc<Catalog>, docs: DocCache, feed: FeedHandle, tree: TreeHandle, normalizer: Normalizer) -> Self {
        Self {
            catalog,
            docs,
            feed,
            tree,
            normalizer,
            catalog_interval: Duration::from_secs(3600),
            docs_interval: Duration::from_secs(300),
        }
    }

    pub fn with_intervals(mut self, catalog: Duration, docs: Duration) -> Self {
        self.catalog_interval = catalog;
        self.docs_interval = docs;
        self
    }

    /// Fetch, parse and publish the repository feed, then evict lazily cached
    /// documentation of packages the new catalog no longer lists.
    #[instrument(skip(self), fields(source = self.feed.name()))]
    pub async fn reload_catalog(&self) -> Result<Stats> {
        let started = Instant::now();
        let bytes = self.feed.fetch_feed().await.or_raise(|| ErrorKind::Fetch)?;
        let feed = Feed::parse(&bytes).or_raise(|| ErrorKind::Parse)?;
        let stats = self
            .catalog
            .replace(feed, &self.normalizer, |name| self.docs.has_example(name))
            .or_raise(|| ErrorKind::Publish)?;
        let listed: HashSet<String> = self.catalog.list().iter().map(|record| record.name.to_lowercase()).collect();
        let evicted = self.docs.retain_lazy(|key| listed.contains(key));
        tracing::info!(
            packages = stats.packages,
            versions = stats.versions,
            skipped = stats.skipped,
            generation = stats.generation,
            evicted,
            duration_ms = started.elapsed().as_millis() as u64,
            "Reloaded catalog"
        );
        Ok(stats)
    }

    /// Bring the documentation tree up to date and reload the cache from it.
    #[instrument(skip(self), fields(source = self.tree.name()))]
    pub async fn reload_docs(&self) -> Result<BulkReport> {
        let started = Instant::now();
        self.tree.sync().await.or_raise(|| ErrorKind::Sync)?;
        let report = self.docs.bulk_replace(&self.tree).await.or_raise(|| ErrorKind::Docs)?;
        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped,
            kept = report.kept,
            duration_ms = started.elapsed().as_millis() as u64,
            "Reloaded documentation"
        );
        Ok(report)
    }

    /// Initial load. Documentation goes first so the catalog's
    /// documentation flags are accurate from the start. Failures are reported
    /// only; the periodic jobs will try again.
    pub async fn startup(&self) {
        if let Err(err) = self.reload_docs().await {
            tracing::error!(error = ?err, "Initial documentation load failed");
        }
        if let Err(err) = self.reload_catalog().await {
            tracing::error!(error = ?err, "Initial catalog load failed");
        }
    }

    /// Start both periodic jobs. The first run of each happens one interval
    /// from now; call [`startup`](Self::startup) for an immediate load.
    ///
    /// Jobs stop when the returned handle is dropped.
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let catalog = {
            let scheduler = Arc::clone(&self);
            every(self.catalog_interval, move || {
                let scheduler = Arc::clone(&scheduler);
                async move {
                    if let Err(err) = scheduler.reload_catalog().await {
                        tracing::error!(error = ?err, "Catalog reload failed, keeping previous catalog");
                    }
                }
            })
        };
        let docs = {
            let scheduler = Arc::clone(&self);
            every(self.docs_interval, move || {
                let scheduler = Arc::clone(&scheduler);
                async move {
                    if let Err(err) = scheduler.reload_docs().await {
                        tracing::error!(error = ?err, "Documentation reload failed, keeping previous documentation");
                    }
                }
            })
        };
        SchedulerHandle { jobs: vec![catalog, docs] }
    }
}

fn every<F, Fut>(period: Duration, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        // A slow reload delays its own next run instead of bunching up.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            job().await;
        }
    })
}

/// Running periodic jobs; dropping this stops them.
#[derive(Debug)]
pub struct SchedulerHandle {
    jobs: Vec<JoinHandle<()>>,
}
impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        for job in &self.jobs {
            job.abort();
        }
    }
}
