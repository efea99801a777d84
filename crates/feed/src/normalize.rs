use crate::models::{Images, PackageRecord, RawPackage};
use serde_json::Value;
use std::collections::HashSet;

const SCREENSHOTS: &str = "screenshots";
/// Placeholder image types and their square dimensions.
const PLACEHOLDERS: [(&str, u32); 3] = [("icon-small", 48), ("icon-medium", 96), ("icon-large", 256)];

/// Turns raw feed records into [`PackageRecord`]s.
///
/// Normalization is a pure transform. Whether a package has documentation is
/// supplied by the caller, so the normalizer has no knowledge of the
/// documentation cache.
#[derive(Debug, Clone)]
pub struct Normalizer {
    placeholder_base: String,
    placeholder_packages: HashSet<String>,
}
impl Default for Normalizer {
    fn default() -> Self {
        Self::new("https://placehold.it", ["dynatrace", "sysdig-cloud"])
    }
}
impl Normalizer {
    pub fn new(placeholder_base: impl Into<String>, placeholder_packages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            placeholder_base: placeholder_base.into().trim_end_matches('/').to_string(),
            placeholder_packages: placeholder_packages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn normalize(&self, raw: RawPackage, has_example: bool) -> PackageRecord {
        let (images, screenshots) = self.images(&raw);
        PackageRecord {
            id: format!("{}-{}", raw.name, raw.release_version),
            description: raw.description.unwrap_or_default(),
            tags: raw.tags,
            version: raw.version,
            release_version: raw.release_version,
            packaging_version: raw.packaging_version,
            min_dcos_release_version: raw.min_dcos_release_version,
            maintainer: raw.maintainer.filter(|s| !s.is_empty()),
            website: raw.website.filter(|s| !s.is_empty()),
            scm: raw.scm.filter(|s| !s.is_empty()),
            is_framework: raw.framework.unwrap_or(false),
            pre_install_notes: raw.pre_install_notes.filter(|s| !s.is_empty()),
            post_install_notes: raw.post_install_notes.filter(|s| !s.is_empty()),
            post_uninstall_notes: raw.post_uninstall_notes.filter(|s| !s.is_empty()),
            licenses: raw.licenses,
            images,
            screenshots,
            has_example,
            name: raw.name,
        }
    }

    fn images(&self, raw: &RawPackage) -> (Images, Option<Vec<String>>) {
        let supplied = raw.images().filter(|images| !images.is_empty());
        let Some(supplied) = supplied.filter(|_| !self.placeholder_packages.contains(&raw.name)) else {
            return (self.placeholders(&raw.name), None);
        };
        let screenshots = supplied.get(SCREENSHOTS).and_then(|value| match value {
            Value::Array(items) => Some(items.iter().filter_map(Value::as_str).map(secure_url).collect()),
            _ => None,
        });
        let images = supplied
            .iter()
            .filter(|(kind, _)| kind.as_str() != SCREENSHOTS)
            .filter_map(|(kind, url)| Some((kind.clone(), secure_url(url.as_str()?))))
            .collect();
        (images, screenshots)
    }

    fn placeholders(&self, name: &str) -> Images {
        PLACEHOLDERS
            .iter()
            .map(|(kind, size)| (kind.to_string(), format!("{}/{size}x{size}&text={name}", self.placeholder_base)))
            .collect()
    }
}

/// Rewrite a case-insensitive `http://` prefix to `https://`.
fn secure_url(url: &str) -> String {
    const INSECURE: &str = "http://";
    match url.get(..INSECURE.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(INSECURE) => format!("https://{}", &url[INSECURE.len()..]),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn raw(value: Value) -> RawPackage {
        serde_json::from_value(value).unwrap()
    }

    #[rstest]
    #[case("http://example.com/a.png", "https://example.com/a.png")]
    #[case("HTTP://example.com/a.png", "https://example.com/a.png")]
    #[case("Http://example.com/a.png", "https://example.com/a.png")]
    #[case("https://example.com/a.png", "https://example.com/a.png")]
    #[case("//example.com/http://a.png", "//example.com/http://a.png")]
    #[case("http:/", "http:/")]
    #[case("", "")]
    fn test_secure_url(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(secure_url(input), expected);
    }

    #[test]
    fn test_normalize_fields() {
        let record = Normalizer::default().normalize(
            raw(json!({
                "name": "cassandra",
                "version": "2.1",
                "releaseVersion": 3,
                "packagingVersion": "3.0",
                "minDcosReleaseVersion": "1.8",
                "description": "Apache Cassandra",
                "tags": ["data", "database"],
                "maintainer": "support@example.com",
                "website": "",
                "framework": true,
                "postInstallNotes": "done",
                "licenses": [{"name": "Apache", "url": "https://apache.org/license"}],
            })),
            true,
        );
        assert_eq!(record.id, "cassandra-3");
        assert_eq!(record.name, "cassandra");
        assert_eq!(record.tags, vec!["data", "database"]);
        assert_eq!(record.packaging_version.as_deref(), Some("3.0"));
        assert_eq!(record.maintainer.as_deref(), Some("support@example.com"));
        // Empty strings are treated as absent.
        assert_eq!(record.website, None);
        assert!(record.is_framework);
        assert!(record.has_example);
        assert_eq!(record.post_install_notes.as_deref(), Some("done"));
        assert_eq!(record.licenses.unwrap()[0].name, "Apache");
    }

    #[test]
    fn test_missing_images_get_placeholders() {
        let record = Normalizer::default().normalize(raw(json!({"name": "kafka", "version": "1", "releaseVersion": 1})), false);
        let keys: Vec<_> = record.images.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["icon-large", "icon-medium", "icon-small"]);
        assert_eq!(record.images["icon-small"], "https://placehold.it/48x48&text=kafka");
        assert_eq!(record.images["icon-medium"], "https://placehold.it/96x96&text=kafka");
        assert_eq!(record.images["icon-large"], "https://placehold.it/256x256&text=kafka");
        assert_eq!(record.screenshots, None);
    }

    #[test]
    fn test_empty_images_get_placeholders() {
        let record = Normalizer::default()
            .normalize(raw(json!({"name": "kafka", "version": "1", "releaseVersion": 1, "resource": {"images": {}}})), false);
        assert_eq!(record.images.len(), 3);
    }

    #[test]
    fn test_supplied_images_are_secured_and_screenshots_lifted() {
        let record = Normalizer::default().normalize(
            raw(json!({
                "name": "jenkins",
                "version": "1",
                "releaseVersion": 1,
                "resource": {"images": {
                    "icon-small": "http://img.example.com/s.png",
                    "icon-large": "https://img.example.com/l.png",
                    "screenshots": ["HTTP://img.example.com/one.png", "https://img.example.com/two.png"],
                }},
            })),
            false,
        );
        assert_eq!(record.images.len(), 2);
        assert_eq!(record.images["icon-small"], "https://img.example.com/s.png");
        assert_eq!(record.images["icon-large"], "https://img.example.com/l.png");
        assert!(!record.images.contains_key("screenshots"));
        assert_eq!(
            record.screenshots.unwrap(),
            vec!["https://img.example.com/one.png", "https://img.example.com/two.png"]
        );
    }

    #[rstest]
    #[case("dynatrace")]
    #[case("sysdig-cloud")]
    fn test_deny_listed_packages_get_placeholders(#[case] name: &str) {
        let record = Normalizer::default().normalize(
            raw(json!({
                "name": name,
                "version": "1",
                "releaseVersion": 1,
                "resource": {"images": {"icon-small": "http://broken.example.com/s.png"}},
            })),
            false,
        );
        assert_eq!(record.images["icon-small"], format!("https://placehold.it/48x48&text={name}"));
        assert_eq!(record.images.len(), 3);
    }

    #[test]
    fn test_custom_placeholder_base() {
        let normalizer = Normalizer::new("https://img.internal/", Vec::<String>::new());
        let record = normalizer.normalize(raw(json!({"name": "spark", "version": "1", "releaseVersion": 1})), false);
        assert_eq!(record.images["icon-small"], "https://img.internal/48x48&text=spark");
    }

    #[test]
    fn test_non_string_image_values_are_dropped() {
        let record = Normalizer::default().normalize(
            raw(json!({
                "name": "spark",
                "version": "1",
                "releaseVersion": 1,
                "resource": {"images": {"icon-small": 12, "icon-medium": "http://a/m.png"}},
            })),
            false,
        );
        assert_eq!(record.images.len(), 1);
        assert_eq!(record.images["icon-medium"], "https://a/m.png");
    }
}
