use super::License;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One package version exactly as the repository feed describes it.
///
/// Only `name`, `version` and `releaseVersion` are required. Every other
/// field is deserialized leniently: a value of the wrong shape becomes the
/// field's default instead of rejecting the whole record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPackage {
    pub name: String,
    #[serde(deserialize_with = "string_like")]
    pub version: String,
    #[serde(deserialize_with = "unsigned_like")]
    pub release_version: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub packaging_version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub min_dcos_release_version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub maintainer: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub scm: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub framework: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub pre_install_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub post_install_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub post_uninstall_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub licenses: Option<Vec<License>>,
    #[serde(default, deserialize_with = "lenient")]
    pub resource: Option<RawResource>,
}
impl RawPackage {
    /// The raw `resource.images` object, if any.
    pub fn images(&self) -> Option<&Map<String, Value>> {
        self.resource.as_ref().and_then(|r| r.images.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawResource {
    #[serde(default, deserialize_with = "lenient")]
    pub images: Option<Map<String, Value>>,
}

/// Deserialize into `T`, or fall back to `T::default()` when the value has
/// the wrong shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Versions are strings in the feed, but some publishers emit bare numbers.
fn string_like<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected a version string, found {other}"))),
    }
}

fn unsigned_like<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().ok_or_else(|| D::Error::custom(format!("invalid release version: {n}"))),
        Value::String(s) => s.trim().parse().map_err(|_| D::Error::custom(format!("invalid release version: {s}"))),
        other => Err(D::Error::custom(format!("expected a release version, found {other}"))),
    }
}
