use std::sync::Arc;
use uniview_catalog::{Catalog, PackageRecord, Stats};
use uniview_docs::DocCache;

/// Version selector that resolves to a family's latest record.
pub const LATEST: &str = "latest";

/// Read-only query surface over the catalog and documentation cache.
///
/// Every lookup answers with a value or `None`; nothing here fails or blocks
/// on a reload in progress.
#[derive(Debug, Clone)]
pub struct Service {
    catalog: Arc<Catalog>,
    docs: DocCache,
}
impl Service {
    pub fn new(catalog: Arc<Catalog>, docs: DocCache) -> Self {
        Self { catalog, docs }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn docs(&self) -> &DocCache {
        &self.docs
    }

    /// Latest record of every family matching `query`, most relevant first.
    pub fn search(&self, query: &str) -> Vec<Arc<PackageRecord>> {
        self.catalog.search(query)
    }

    /// Latest record of every family, sorted by name.
    pub fn list(&self) -> Vec<Arc<PackageRecord>> {
        self.catalog.list()
    }

    pub fn get_latest(&self, name: &str) -> Option<Arc<PackageRecord>> {
        self.catalog.get_latest(name)
    }

    /// Record for an exact version string, or the latest for `"latest"`.
    pub fn get_version(&self, name: &str, version: &str) -> Option<Arc<PackageRecord>> {
        match version {
            LATEST => self.catalog.get_latest(name),
            version => self.catalog.get_version(name, version),
        }
    }

    /// Record for a release version, or the latest for `"latest"`.
    pub fn get_release_version(&self, name: &str, release_version: &str) -> Option<Arc<PackageRecord>> {
        match release_version {
            LATEST => self.catalog.get_latest(name),
            release_version => self.catalog.get_release_version(name, release_version),
        }
    }

    pub fn list_versions(&self, name: &str) -> Option<Vec<String>> {
        self.catalog.list_versions(name)
    }

    pub fn list_release_versions(&self, name: &str) -> Option<Vec<String>> {
        self.catalog.list_release_versions(name)
    }

    /// Rendered documentation of a catalog package.
    ///
    /// Names the catalog doesn't know are answered with `None` straight away,
    /// so unknown names never reach the documentation source.
    pub async fn get_docs(&self, name: &str) -> Option<Arc<str>> {
        if !self.catalog.contains(name) {
            return None;
        }
        self.docs.get(name).await
    }

    pub fn stats(&self) -> Stats {
        self.catalog.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uniview_feed::{Feed, Normalizer};
    use uniview_render::Markdown;
    use uniview_source::backend::MockDocs;

    fn service(docs: &Arc<MockDocs>) -> Service {
        let catalog = Arc::new(Catalog::new());
        let feed = Feed::parse(
            br#"{"packages": [
                {"name": "cassandra", "version": "2.1", "releaseVersion": 3},
                {"name": "cassandra", "version": "2.2", "releaseVersion": 5},
                {"name": "kafka", "version": "1.0", "releaseVersion": 1}
            ]}"#,
        )
        .unwrap();
        catalog.replace(feed, &Normalizer::default(), |_| false).unwrap();
        let docs = DocCache::new(docs.clone(), Arc::new(Markdown::new()), Duration::from_secs(60));
        Service::new(catalog, docs)
    }

    #[test]
    fn test_latest_alias() {
        let service = service(&Arc::new(MockDocs::default()));
        assert_eq!(service.get_version("cassandra", LATEST).unwrap().version, "2.2");
        assert_eq!(service.get_release_version("cassandra", LATEST).unwrap().release_version, 5);
        assert_eq!(service.get_version("cassandra", "2.1").unwrap().release_version, 3);
        assert_eq!(service.get_release_version("cassandra", "3").unwrap().version, "2.1");
        assert!(service.get_version("nope", LATEST).is_none());
        assert!(service.get_release_version("nope", LATEST).is_none());
    }

    #[test]
    fn test_listing_queries() {
        let service = service(&Arc::new(MockDocs::default()));
        let names: Vec<_> = service.list().iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, vec!["cassandra", "kafka"]);
        assert_eq!(service.list_versions("cassandra").unwrap(), vec!["2.1", "2.2"]);
        assert_eq!(service.list_release_versions("cassandra").unwrap(), vec!["3", "5"]);
        assert!(service.list_versions("nope").is_none());
        assert_eq!(service.search("kafka").len(), 1);
        assert_eq!(service.stats().packages, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_docs_for_catalog_packages_only() {
        let docs = Arc::new(MockDocs::with_readmes([("cassandra", "# Cassandra"), ("unlisted", "# Unlisted")]));
        let service = service(&docs);
        assert!(service.get_docs("cassandra").await.unwrap().contains("<h1>Cassandra</h1>"));
        assert!(service.get_docs("unlisted").await.is_none());
        assert!(service.get_docs("kafka").await.is_none());
        assert_eq!(docs.fetches(), 2);
        assert_eq!(service.docs().len(), 2);
    }
}
