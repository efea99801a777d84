//! HTTP sources for the repository feed and raw documentation files.

use crate::backend::{DocSource, FeedSource, README};
use crate::error::{ErrorKind, Result};
use crate::path::validate_segment;
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::instrument;

/// GET a URL and return the whole body, mapping non-success statuses to
/// errors.
async fn get(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await.or_raise(|| ErrorKind::Network(url.to_string()))?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        exn::bail!(ErrorKind::NotFound(url.to_string()));
    }
    if !status.is_success() {
        exn::bail!(ErrorKind::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response.bytes().await.or_raise(|| ErrorKind::Network(url.to_string()))?;
    Ok(body.to_vec())
}

/// Fetches the repository feed over HTTP(S).
///
/// Universe servers negotiate the document format on the `user-agent` and
/// `accept` headers, so both are sent with every request.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use uniview_source::backend::HttpFeed;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let feed = HttpFeed::new(
///     "universe",
///     "https://universe.mesosphere.com/repo",
///     "dcos/1.8",
///     "application/vnd.dcos.universe.repo+json;charset=utf-8;version=v3",
///     Duration::from_secs(30),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFeed {
    name: String,
    url: String,
    client: Client,
}
impl HttpFeed {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        user_agent: &str,
        accept: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let accept = HeaderValue::from_str(accept).or_raise(|| ErrorKind::Network(format!("invalid accept header: {accept}")))?;
        headers.insert(ACCEPT, accept);
        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::Network("could not build HTTP client".to_string()))?;
        Ok(Self {
            name: name.into(),
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(source = %self.name, url = %self.url))]
    async fn fetch_feed(&self) -> Result<Vec<u8>> {
        get(&self.client, &self.url).await
    }
}

/// Fetches package READMEs from a raw-content host, one request per package.
///
/// Documents live at `{base}/{package}/README.md`.
#[derive(Debug, Clone)]
pub struct HttpDocs {
    name: String,
    base: String,
    client: Client,
}
impl HttpDocs {
    pub fn new(name: impl Into<String>, base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("uniview/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::Network("could not build HTTP client".to_string()))?;
        Ok(Self {
            name: name.into(),
            base: base.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl DocSource for HttpDocs {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self, package: &str) -> String {
        format!("{}/{package}", self.base)
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn fetch_readme(&self, package: &str) -> Result<Vec<u8>> {
        let package = validate_segment(package)?;
        let url = format!("{}/{README}", self.base_url(package));
        get(&self.client, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docs_base_url() {
        let docs = HttpDocs::new("raw", "https://raw.example.com/examples/master/1.8/", Duration::from_secs(1)).unwrap();
        assert_eq!(docs.base_url("cassandra"), "https://raw.example.com/examples/master/1.8/cassandra");
    }

    #[tokio::test]
    async fn test_docs_rejects_unsafe_names_before_fetching() {
        let docs = HttpDocs::new("raw", "https://raw.example.invalid", Duration::from_secs(1)).unwrap();
        let err = docs.fetch_readme("../secrets").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_feed_rejects_invalid_accept_header() {
        let result = HttpFeed::new("feed", "https://example.invalid/repo", "dcos/1.8", "bad\nheader", Duration::from_secs(1));
        assert!(result.is_err());
    }
}
