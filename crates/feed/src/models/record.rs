use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Image type (`icon-small`, `icon-medium`, ...) to URL.
pub type Images = BTreeMap<String, String>;

/// The reduced, stable description of one package version that the catalog
/// stores and serves.
///
/// Records are immutable once normalized; the catalog shares them between
/// its version, release-version and latest lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    /// `{name}-{releaseVersion}`
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub version: String,
    /// Monotonic revision assigned by the feed; picks the latest record.
    pub release_version: u64,
    pub packaging_version: Option<String>,
    pub min_dcos_release_version: Option<String>,
    pub maintainer: Option<String>,
    pub website: Option<String>,
    pub scm: Option<String>,
    pub is_framework: bool,
    pub pre_install_notes: Option<String>,
    pub post_install_notes: Option<String>,
    pub post_uninstall_notes: Option<String>,
    pub licenses: Option<Vec<License>>,
    /// HTTPS-only image URLs, or generated placeholders.
    pub images: Images,
    pub screenshots: Option<Vec<String>>,
    /// Whether rendered documentation existed when this record was built.
    pub has_example: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}
