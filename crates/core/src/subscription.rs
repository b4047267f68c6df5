use async_trait::async_trait;
use thiserror::Error;

/// A per-user named feed subscription.
///
/// Identity is the composite `(user_id, alias)` pair; `feed_url` is the
/// only mutable field and is replaced wholesale on re-subscribe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub user_id: String,
    pub alias: String,
    pub feed_url: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Capability interface over the durable `(user, alias) -> url` mapping.
///
/// Implementations must make `upsert` atomic for a given key (last writer
/// wins, no lost updates) and `delete` a no-op for absent keys.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn upsert(&self, user_id: &str, alias: &str, feed_url: &str) -> Result<(), StoreError>;

    async fn delete(&self, user_id: &str, alias: &str) -> Result<(), StoreError>;

    async fn get(&self, user_id: &str, alias: &str) -> Result<Option<String>, StoreError>;

    async fn list_all(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError>;
}
