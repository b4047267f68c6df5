pub mod config;
pub mod feed;
pub mod subscription;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use feed::{
    clamp_feed_size, Feed, FeedEntry, FeedError, FeedFetcher, DEFAULT_FEED_SIZE, MAX_FEED_SIZE,
    MIN_FEED_SIZE,
};
pub use subscription::{StoreError, Subscription, SubscriptionStore};
