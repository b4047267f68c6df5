use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of entries rendered when no size argument is given.
pub const DEFAULT_FEED_SIZE: usize = 10;
/// Smallest renderable feed size.
pub const MIN_FEED_SIZE: usize = 1;
/// Largest renderable feed size.
pub const MAX_FEED_SIZE: usize = 25;

/// A single entry of a syndication feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
}

/// A fetched feed: channel title plus entries in source order.
///
/// Feeds are transient and fetched fresh per request; entries keep whatever
/// order the source emitted and are only ever truncated, never reordered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub items: Vec<FeedEntry>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("http request failed for `{url}`: {reason}")]
    Http { url: String, reason: String },
    #[error("feed at `{url}` could not be parsed: {reason}")]
    Parse { url: String, reason: String },
}

impl FeedError {
    pub fn url(&self) -> &str {
        match self {
            Self::Http { url, .. } | Self::Parse { url, .. } => url,
        }
    }
}

/// Capability interface for resolving a URL to a structured feed.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Feed, FeedError>;
}

/// Clamp a raw size argument to the renderable range.
///
/// An absent or non-integer argument resolves to [`DEFAULT_FEED_SIZE`];
/// anything else is clamped into `[MIN_FEED_SIZE, MAX_FEED_SIZE]`.
pub fn clamp_feed_size(raw: Option<&str>) -> usize {
    match raw.and_then(|value| value.trim().parse::<i64>().ok()) {
        Some(parsed) => parsed.clamp(MIN_FEED_SIZE as i64, MAX_FEED_SIZE as i64) as usize,
        None => DEFAULT_FEED_SIZE,
    }
}
