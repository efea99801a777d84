use crate::error::Result;
use crate::family::PackageFamily;
use crate::search::SearchIndex;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uniview_feed::models::PackageRecord;
use uniview_feed::{Feed, Normalizer};

/// Counts describing a published snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of distinct package names.
    pub packages: usize,
    /// Number of distinct (package, version) pairs.
    pub versions: usize,
    /// Records the feed contained but the parser had to drop.
    pub skipped: usize,
    /// Incremented by every successful reload; `0` means never loaded.
    pub generation: u64,
}

/// One consistent view of the catalog: families, the sorted listing and the
/// search index are always built from the same feed.
#[derive(Debug, Default)]
pub struct Snapshot {
    families: HashMap<String, Arc<PackageFamily>>,
    listing: Vec<Arc<PackageRecord>>,
    index: Option<SearchIndex>,
    stats: Stats,
}
impl Snapshot {
    fn build(feed: Feed, normalizer: &Normalizer, has_example: impl Fn(&str) -> bool, generation: u64) -> Result<Self> {
        let mut families: HashMap<String, PackageFamily> = HashMap::new();
        for raw in feed.packages {
            let has_example = has_example(&raw.name);
            let record = Arc::new(normalizer.normalize(raw, has_example));
            match families.get_mut(&record.name) {
                Some(family) => {
                    family.insert(record);
                },
                None => {
                    families.insert(record.name.clone(), PackageFamily::new(record));
                },
            }
        }
        let mut listing: Vec<_> = families.values().map(|family| Arc::clone(family.latest())).collect();
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        let index = SearchIndex::build(&listing)?;
        let stats = Stats {
            packages: families.len(),
            versions: families.values().map(PackageFamily::len).sum(),
            skipped: feed.skipped,
            generation,
        };
        Ok(Self {
            families: families.into_iter().map(|(name, family)| (name, Arc::new(family))).collect(),
            listing,
            index: Some(index),
            stats,
        })
    }

    pub fn family(&self, name: &str) -> Option<&Arc<PackageFamily>> {
        self.families.get(name)
    }

    /// Latest record of every family, sorted by name.
    pub fn listing(&self) -> &[Arc<PackageRecord>] {
        &self.listing
    }

    /// Latest record of every matching family, most relevant first.
    pub fn search(&self, query: &str) -> Vec<Arc<PackageRecord>> {
        let Some(index) = &self.index else {
            return Vec::new();
        };
        index
            .search(query)
            .iter()
            .filter_map(|name| self.families.get(name).map(|family| Arc::clone(family.latest())))
            .collect()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }
}

/// The package catalog.
///
/// Constructed once and shared; reloads swap the whole [`Snapshot`]
/// atomically, so readers never lock and never observe a half-built catalog.
/// Until the first successful reload the catalog is empty.
///
/// # Examples
///
/// ```
/// use uniview_catalog::Catalog;
/// use uniview_feed::{Feed, Normalizer};
///
/// let catalog = Catalog::new();
/// let feed = Feed::parse(br#"{"packages": [
///     {"name": "cassandra", "version": "2.1", "releaseVersion": 3},
///     {"name": "cassandra", "version": "2.2", "releaseVersion": 5}
/// ]}"#).unwrap();
/// catalog.replace(feed, &Normalizer::default(), |_| false).unwrap();
///
/// assert_eq!(catalog.get_latest("cassandra").unwrap().release_version, 5);
/// assert_eq!(catalog.get_version("cassandra", "2.1").unwrap().release_version, 3);
/// assert_eq!(catalog.list_release_versions("cassandra").unwrap(), vec!["3", "5"]);
/// ```
#[derive(Debug)]
pub struct Catalog {
    snapshot: ArcSwap<Snapshot>,
    /// Generation of the published snapshot. Held across build and store so
    /// overlapping reloads publish in order.
    generation: Mutex<u64>,
}
impl Catalog {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
            generation: Mutex::new(0),
        }
    }

    /// Rebuild the catalog from a parsed feed and publish it.
    ///
    /// `has_example` reports whether documentation exists for a package name
    /// at the time of the reload. On error nothing is published and the
    /// previous snapshot keeps being served.
    #[instrument(skip_all, fields(records = feed.len()))]
    pub fn replace(&self, feed: Feed, normalizer: &Normalizer, has_example: impl Fn(&str) -> bool) -> Result<Stats> {
        let mut published = self.generation.lock();
        let generation = *published + 1;
        let snapshot = Snapshot::build(feed, normalizer, has_example, generation)?;
        let stats = snapshot.stats();
        self.snapshot.store(Arc::new(snapshot));
        *published = generation;
        drop(published);
        tracing::debug!(packages = stats.packages, versions = stats.versions, generation, "Published catalog snapshot");
        Ok(stats)
    }

    /// The current snapshot; use it when several reads must agree with each
    /// other.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    pub fn search(&self, query: &str) -> Vec<Arc<PackageRecord>> {
        self.snapshot.load().search(query)
    }

    pub fn list(&self) -> Vec<Arc<PackageRecord>> {
        self.snapshot.load().listing().to_vec()
    }

    pub fn get_family(&self, name: &str) -> Option<Arc<PackageFamily>> {
        self.snapshot.load().family(name).cloned()
    }

    pub fn get_latest(&self, name: &str) -> Option<Arc<PackageRecord>> {
        self.snapshot.load().family(name).map(|family| Arc::clone(family.latest()))
    }

    pub fn get_version(&self, name: &str, version: &str) -> Option<Arc<PackageRecord>> {
        self.snapshot.load().family(name)?.version(version).cloned()
    }

    pub fn get_release_version(&self, name: &str, release_version: &str) -> Option<Arc<PackageRecord>> {
        self.snapshot.load().family(name)?.release_version(release_version).cloned()
    }

    pub fn list_versions(&self, name: &str) -> Option<Vec<String>> {
        Some(self.snapshot.load().family(name)?.versions().map(str::to_string).collect())
    }

    pub fn list_release_versions(&self, name: &str) -> Option<Vec<String>> {
        Some(self.snapshot.load().family(name)?.release_versions().map(str::to_string).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshot.load().family(name).is_some()
    }

    pub fn stats(&self) -> Stats {
        self.snapshot.load().stats()
    }
}
impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
