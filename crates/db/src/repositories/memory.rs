use tokio::sync::RwLock;

use feedhorn_core::subscription::{StoreError, Subscription, SubscriptionStore};

/// In-memory store for tests and ephemeral deployments.
///
/// The write lock serializes upserts and deletes, so racing writes for the
/// same `(user_id, alias)` key resolve last-writer-wins like the SQL store.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: RwLock<Vec<Subscription>>,
}

#[async_trait::async_trait]
impl SubscriptionStore for InMemorySubscriptionRepository {
    async fn upsert(&self, user_id: &str, alias: &str, feed_url: &str) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.write().await;
        match subscriptions
            .iter_mut()
            .find(|sub| sub.user_id == user_id && sub.alias == alias)
        {
            Some(existing) => existing.feed_url = feed_url.to_owned(),
            None => subscriptions.push(Subscription {
                user_id: user_id.to_owned(),
                alias: alias.to_owned(),
                feed_url: feed_url.to_owned(),
            }),
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str, alias: &str) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.retain(|sub| !(sub.user_id == user_id && sub.alias == alias));
        Ok(())
    }

    async fn get(&self, user_id: &str, alias: &str) -> Result<Option<String>, StoreError> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions
            .iter()
            .find(|sub| sub.user_id == user_id && sub.alias == alias)
            .map(|sub| sub.feed_url.clone()))
    }

    async fn list_all(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions.iter().filter(|sub| sub.user_id == user_id).cloned().collect())
    }
}
