use std::collections::BTreeMap;
use std::sync::Arc;
use uniview_feed::models::PackageRecord;

/// Every known version of one named package.
///
/// Records are shared between the version map, the release-version map and
/// `latest`; nothing is copied per lookup.
#[derive(Debug, Clone)]
pub struct PackageFamily {
    name: String,
    versions: BTreeMap<String, Arc<PackageRecord>>,
    release_versions: BTreeMap<String, Arc<PackageRecord>>,
    latest: Arc<PackageRecord>,
}
impl PackageFamily {
    /// Start a family from its first record, which is (for now) the latest.
    pub fn new(record: Arc<PackageRecord>) -> Self {
        let mut family = Self {
            name: record.name.clone(),
            versions: BTreeMap::new(),
            release_versions: BTreeMap::new(),
            latest: Arc::clone(&record),
        };
        family.index(record);
        family
    }

    /// Add a record to the family.
    ///
    /// A record replaces `latest` only when its release version is strictly
    /// greater, so on ties the earlier record in feed order wins. Returns
    /// `true` when the record became the latest.
    pub fn insert(&mut self, record: Arc<PackageRecord>) -> bool {
        debug_assert_eq!(record.name, self.name);
        let promoted = record.release_version > self.latest.release_version;
        if promoted {
            self.latest = Arc::clone(&record);
        }
        self.index(record);
        promoted
    }

    fn index(&mut self, record: Arc<PackageRecord>) {
        self.versions.insert(record.version.clone(), Arc::clone(&record));
        self.release_versions.insert(record.release_version.to_string(), record);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latest(&self) -> &Arc<PackageRecord> {
        &self.latest
    }

    pub fn version(&self, version: &str) -> Option<&Arc<PackageRecord>> {
        self.versions.get(version)
    }

    pub fn release_version(&self, release_version: &str) -> Option<&Arc<PackageRecord>> {
        self.release_versions.get(release_version)
    }

    /// Version strings, sorted lexicographically.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }

    /// Release versions as strings, sorted lexicographically (so `"10"` comes
    /// before `"9"`).
    pub fn release_versions(&self) -> impl Iterator<Item = &str> {
        self.release_versions.keys().map(String::as_str)
    }

    /// Number of distinct version strings.
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uniview_feed::Normalizer;
    use uniview_feed::models::RawPackage;

    fn record(name: &str, version: &str, release_version: u64) -> Arc<PackageRecord> {
        let raw: RawPackage = serde_json::from_value(serde_json::json!({
            "name": name,
            "version": version,
            "releaseVersion": release_version,
        }))
        .unwrap();
        Arc::new(Normalizer::default().normalize(raw, false))
    }

    #[test]
    fn test_latest_is_highest_release_version() {
        let mut family = PackageFamily::new(record("cassandra", "2.1", 3));
        assert!(family.insert(record("cassandra", "2.2", 5)));
        assert!(!family.insert(record("cassandra", "2.0", 1)));
        assert_eq!(family.latest().release_version, 5);
        assert_eq!(family.version("2.1").unwrap().release_version, 3);
        assert_eq!(family.release_version("1").unwrap().version, "2.0");
        assert_eq!(family.len(), 3);
    }

    #[test]
    fn test_ties_keep_first_record() {
        let mut family = PackageFamily::new(record("kafka", "first", 7));
        assert!(!family.insert(record("kafka", "second", 7)));
        assert_eq!(family.latest().version, "first");
        // The release-version slot itself is last-write-wins.
        assert_eq!(family.release_version("7").unwrap().version, "second");
    }

    #[test]
    fn test_keys_are_lexicographic() {
        let mut family = PackageFamily::new(record("spark", "1.10", 9));
        family.insert(record("spark", "1.9", 10));
        assert_eq!(family.versions().collect::<Vec<_>>(), vec!["1.10", "1.9"]);
        assert_eq!(family.release_versions().collect::<Vec<_>>(), vec!["10", "9"]);
    }
}
