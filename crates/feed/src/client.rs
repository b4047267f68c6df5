use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use feedhorn_core::feed::{Feed, FeedError, FeedFetcher};

use crate::parser::parse_rss_feed;

/// RSS feed fetcher backed by a shared HTTP client.
///
/// Every request is bounded by the client's timeout, so a hanging upstream
/// resolves to a recoverable [`FeedError`] instead of blocking the caller.
pub struct RssFetcher {
    client: Client,
}

impl RssFetcher {
    /// Build a fetcher with a per-request timeout.
    pub fn new(fetch_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(fetch_timeout).build()?;
        Ok(Self { client })
    }

    /// Build a fetcher around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedFetcher for RssFetcher {
    async fn fetch(&self, url: &str) -> Result<Feed, FeedError> {
        tracing::debug!("fetching feed from: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| FeedError::Http { url: url.to_owned(), reason: error.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Http {
                url: url.to_owned(),
                reason: format!("unexpected status {status}"),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| FeedError::Http { url: url.to_owned(), reason: error.to_string() })?;

        let feed = parse_rss_feed(&bytes)
            .map_err(|reason| FeedError::Parse { url: url.to_owned(), reason })?;

        tracing::debug!("parsed {} entries from feed", feed.items.len());
        Ok(feed)
    }
}
