//! Layered configuration for uniview.
//!
//! Values are merged in order of increasing priority:
//! 1. built-in defaults ([`Config::default`]),
//! 2. an optional configuration file (TOML, YAML or JSON, chosen by extension),
//! 3. environment variables prefixed with `UNIVIEW_`, using `__` to descend
//!    into sections (`UNIVIEW_FEED__REFRESH_SECS=600`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "UNIVIEW_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub docs: DocsConfig,
    pub images: ImageConfig,
}

/// Where and how often to fetch the repository feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub user_agent: String,
    pub accept: String,
    pub timeout_secs: u64,
    pub refresh_secs: u64,
}
impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "https://universe.mesosphere.com/repo".to_string(),
            user_agent: "dcos/1.8".to_string(),
            accept: "application/vnd.dcos.universe.repo+json;charset=utf-8;version=v3".to_string(),
            timeout_secs: 30,
            refresh_secs: 3600,
        }
    }
}
impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

/// The companion examples repository that documentation is rendered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Git remote that gets cloned into [`checkout`](Self::checkout).
    pub repository: String,
    pub branch: String,
    /// Local checkout directory. Defaults to the platform cache directory.
    pub checkout: Option<PathBuf>,
    /// Folder inside the repository that holds one folder per package.
    pub subdirectory: String,
    /// Base URL that serves raw files from [`subdirectory`](Self::subdirectory).
    /// Used both for lazy README fetches and for absolute image links.
    pub raw_base_url: String,
    pub bulk_refresh_secs: u64,
    pub lazy_refresh_secs: u64,
}
impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            repository: "https://github.com/dcos/examples.git".to_string(),
            branch: "master".to_string(),
            checkout: None,
            subdirectory: "1.8".to_string(),
            raw_base_url: "https://raw.githubusercontent.com/dcos/examples/master/1.8".to_string(),
            bulk_refresh_secs: 300,
            lazy_refresh_secs: 60,
        }
    }
}
impl DocsConfig {
    pub fn bulk_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.bulk_refresh_secs)
    }

    pub fn lazy_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.lazy_refresh_secs)
    }

    /// Resolve the checkout directory, falling back to the platform cache
    /// directory (or the system temp directory when no home is available).
    pub fn checkout_dir(&self) -> PathBuf {
        if let Some(dir) = &self.checkout {
            return dir.clone();
        }
        match ProjectDirs::from("io", "uniview", "uniview") {
            Some(dirs) => dirs.cache_dir().join("examples"),
            None => {
                tracing::debug!("No home directory for project dirs; using temp dir for checkout");
                std::env::temp_dir().join("uniview-examples")
            },
        }
    }
}

/// Package image handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub placeholder_base: String,
    /// Packages that always receive placeholder images, because upstream
    /// ships broken image metadata for them.
    pub placeholder_packages: Vec<String>,
}
impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            placeholder_base: "https://placehold.it".to_string(),
            placeholder_packages: vec!["dynatrace".to_string(), "sysdig-cloud".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional file, and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            if !path.exists() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        let config: Config = figment.merge(Env::prefixed(ENV_PREFIX).split("__")).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let checks: [(bool, &'static str, &'static str); 7] = [
            (self.feed.url.trim().is_empty(), "feed.url", "must not be empty"),
            (self.feed.refresh_secs == 0, "feed.refresh_secs", "must be greater than zero"),
            (self.feed.timeout_secs == 0, "feed.timeout_secs", "must be greater than zero"),
            (self.docs.raw_base_url.trim().is_empty(), "docs.raw_base_url", "must not be empty"),
            (self.docs.bulk_refresh_secs == 0, "docs.bulk_refresh_secs", "must be greater than zero"),
            (self.docs.lazy_refresh_secs == 0, "docs.lazy_refresh_secs", "must be greater than zero"),
            (self.images.placeholder_base.trim().is_empty(), "images.placeholder_base", "must not be empty"),
        ];
        for (failed, field, reason) in checks {
            if failed {
                exn::bail!(ErrorKind::Invalid { field, reason });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.feed.refresh_interval(), Duration::from_secs(3600));
        assert_eq!(config.docs.lazy_refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.images.placeholder_packages, vec!["dynatrace", "sysdig-cloud"]);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[rstest]
    #[case("uniview.toml", "[feed]\nrefresh_secs = 120\n")]
    #[case("uniview.yaml", "feed:\n  refresh_secs: 120\n")]
    #[case("uniview.json", r#"{"feed": {"refresh_secs": 120}}"#)]
    fn test_load_file_formats(#[case] name: &str, #[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::File::create(&path).unwrap().write_all(contents.as_bytes()).unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.feed.refresh_secs, 120);
        // Untouched values keep their defaults.
        assert_eq!(config.feed.url, FeedConfig::default().url);
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("uniview.toml", "[docs]\nlazy_refresh_secs = 30\nsubdirectory = \"1.9\"\n")?;
            jail.set_env("UNIVIEW_DOCS__LAZY_REFRESH_SECS", "15");
            let config = Config::load(Some(Path::new("uniview.toml"))).unwrap();
            assert_eq!(config.docs.lazy_refresh_secs, 15);
            assert_eq!(config.docs.subdirectory, "1.9");
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uniview.ini");
        std::fs::write(&path, "refresh = 1").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[rstest]
    #[case("feed.refresh_secs")]
    #[case("docs.lazy_refresh_secs")]
    #[case("feed.url")]
    fn test_validation_rejects(#[case] field: &str) {
        let mut config = Config::default();
        match field {
            "feed.refresh_secs" => config.feed.refresh_secs = 0,
            "docs.lazy_refresh_secs" => config.docs.lazy_refresh_secs = 0,
            "feed.url" => config.feed.url = "  ".to_string(),
            _ => unreachable!(),
        }
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid { field: f, .. } if *f == field));
    }

    #[test]
    fn test_explicit_checkout_dir() {
        let config = DocsConfig {
            checkout: Some(PathBuf::from("/srv/examples")),
            ..DocsConfig::default()
        };
        assert_eq!(config.checkout_dir(), PathBuf::from("/srv/examples"));
    }
}
