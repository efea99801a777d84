//! Package catalog aggregator.
//!
//! Periodically pulls a Universe-style repository feed into an in-memory,
//! searchable [`Catalog`](uniview_catalog::Catalog), keeps a cache of rendered
//! per-package documentation next to it, and answers read queries through
//! [`Service`].

pub mod error;
mod scheduler;
mod service;

pub use crate::scheduler::{Scheduler, SchedulerHandle};
pub use crate::service::{LATEST, Service};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::sync::Arc;
use uniview_catalog::Catalog;
use uniview_config::Config;
use uniview_docs::DocCache;
use uniview_feed::Normalizer;
use uniview_render::Markdown;
use uniview_source::backend::{GitCheckout, HttpDocs, HttpFeed, LocalTree};
use uniview_source::{DocHandle, FeedHandle, TreeHandle};

/// A wired-up application: the query surface and the scheduler that keeps it
/// fresh, sharing one catalog and one documentation cache.
pub struct App {
    pub service: Service,
    pub scheduler: Arc<Scheduler>,
}
impl App {
    /// Build the HTTP feed, raw documentation and git checkout sources
    /// described by `config`. Nothing is fetched yet.
    ///
    /// Without a `git` executable the documentation tree is read from the
    /// checkout directory as is, and never updated.
    pub fn from_config(config: &Config) -> Result<Self> {
        let feed = HttpFeed::new(
            "universe",
            &config.feed.url,
            &config.feed.user_agent,
            &config.feed.accept,
            config.feed.timeout(),
        )
        .or_raise(|| ErrorKind::Config)?;
        let docs = HttpDocs::new("examples", &config.docs.raw_base_url, config.feed.timeout()).or_raise(|| ErrorKind::Config)?;
        let checkout = config.docs.checkout_dir();
        let tree: TreeHandle = match GitCheckout::new(
            "examples",
            &config.docs.repository,
            &config.docs.branch,
            &checkout,
            &config.docs.subdirectory,
        ) {
            Ok(tree) => Arc::new(tree),
            Err(err) => {
                tracing::warn!(error = ?err, "Serving documentation from the existing checkout only");
                let root = checkout.join(&config.docs.subdirectory);
                Arc::new(LocalTree::new("examples", root).or_raise(|| ErrorKind::Config)?)
            },
        };
        Ok(Self::assemble(config, Arc::new(feed), Arc::new(docs), tree))
    }

    /// Wire arbitrary sources together using the intervals and image settings
    /// from `config`.
    pub fn assemble(config: &Config, feed: FeedHandle, docs: DocHandle, tree: TreeHandle) -> Self {
        let catalog = Arc::new(Catalog::new());
        let cache = DocCache::new(docs, Arc::new(Markdown::new()), config.docs.lazy_refresh_interval());
        let normalizer = Normalizer::new(&config.images.placeholder_base, &config.images.placeholder_packages);
        let scheduler = Scheduler::new(Arc::clone(&catalog), cache.clone(), feed, tree, normalizer)
            .with_intervals(config.feed.refresh_interval(), config.docs.bulk_refresh_interval());
        Self {
            service: Service::new(catalog, cache),
            scheduler: Arc::new(scheduler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uniview_source::backend::{MockDocs, MockFeed, MockTree};

    #[tokio::test]
    async fn test_assemble_uses_image_config() {
        let mut config = Config::default();
        config.images.placeholder_base = "https://img.example.com/".to_string();
        let feed = Arc::new(MockFeed::new(
            r#"{"packages": [{"name": "dynatrace", "version": "1", "releaseVersion": 1,
                "resource": {"images": {"icon-small": "http://cdn.example.com/s.png"}}}]}"#,
        ));
        let docs = Arc::new(MockDocs::default());
        let tree = Arc::new(MockTree::default());
        let app = App::assemble(&config, feed, docs, tree);
        app.scheduler.reload_catalog().await.unwrap();

        let record = app.service.get_latest("dynatrace").unwrap();
        assert_eq!(record.images.len(), 3);
        assert_eq!(record.images["icon-small"], "https://img.example.com/48x48&text=dynatrace");
    }
}
