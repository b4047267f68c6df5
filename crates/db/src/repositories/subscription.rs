use sqlx::Row;

use feedhorn_core::subscription::{StoreError, Subscription, SubscriptionStore};

use crate::DbPool;

pub struct SqlSubscriptionRepository {
    pool: DbPool,
}

impl SqlSubscriptionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn store_error(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn row_to_subscription(row: &sqlx::sqlite::SqliteRow) -> Result<Subscription, StoreError> {
    let user_id: String =
        row.try_get("user_id").map_err(|e| StoreError::Backend(e.to_string()))?;
    let alias: String = row.try_get("alias").map_err(|e| StoreError::Backend(e.to_string()))?;
    let feed_url: String =
        row.try_get("feed_url").map_err(|e| StoreError::Backend(e.to_string()))?;

    Ok(Subscription { user_id, alias, feed_url })
}

#[async_trait::async_trait]
impl SubscriptionStore for SqlSubscriptionRepository {
    async fn upsert(&self, user_id: &str, alias: &str, feed_url: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO subscription (user_id, alias, feed_url)
             VALUES (?, ?, ?)
             ON CONFLICT(user_id, alias) DO UPDATE SET
                 feed_url = excluded.feed_url",
        )
        .bind(user_id)
        .bind(alias)
        .bind(feed_url)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn delete(&self, user_id: &str, alias: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM subscription WHERE user_id = ? AND alias = ?")
            .bind(user_id)
            .bind(alias)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn get(&self, user_id: &str, alias: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(
            "SELECT feed_url FROM subscription WHERE user_id = ? AND alias = ?",
        )
        .bind(user_id)
        .bind(alias)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        match row {
            Some(row) => {
                let feed_url: String =
                    row.try_get("feed_url").map_err(|e| StoreError::Backend(e.to_string()))?;
                Ok(Some(feed_url))
            }
            None => Ok(None),
        }
    }

    async fn list_all(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT user_id, alias, feed_url FROM subscription
             WHERE user_id = ? ORDER BY rowid ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.iter().map(row_to_subscription).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use feedhorn_core::subscription::SubscriptionStore;

    use super::SqlSubscriptionRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn upsert_and_get_round_trip() {
        let pool = setup().await;
        let repo = SqlSubscriptionRepository::new(pool);

        repo.upsert("u1", "news", "http://a").await.expect("upsert");
        let url = repo.get("u1", "news").await.expect("get");

        assert_eq!(url.as_deref(), Some("http://a"));
    }

    #[tokio::test]
    async fn upsert_overwrites_without_duplicating_rows() {
        let pool = setup().await;
        let repo = SqlSubscriptionRepository::new(pool);

        repo.upsert("u1", "news", "http://a").await.expect("first upsert");
        repo.upsert("u1", "news", "http://b").await.expect("second upsert");

        let url = repo.get("u1", "news").await.expect("get");
        assert_eq!(url.as_deref(), Some("http://b"));

        let subs = repo.list_all("u1").await.expect("list");
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].alias, "news");
        assert_eq!(subs[0].feed_url, "http://b");
    }

    #[tokio::test]
    async fn delete_missing_alias_is_a_no_op() {
        let pool = setup().await;
        let repo = SqlSubscriptionRepository::new(pool);

        repo.upsert("u1", "news", "http://a").await.expect("upsert");
        repo.delete("u1", "missing").await.expect("delete of absent alias succeeds");

        let subs = repo.list_all("u1").await.expect("list");
        assert_eq!(subs.len(), 1, "store state should be unchanged");
    }

    #[tokio::test]
    async fn delete_removes_only_the_targeted_alias() {
        let pool = setup().await;
        let repo = SqlSubscriptionRepository::new(pool);

        repo.upsert("u1", "news", "http://a").await.expect("upsert news");
        repo.upsert("u1", "tech", "http://b").await.expect("upsert tech");
        repo.delete("u1", "news").await.expect("delete news");

        assert_eq!(repo.get("u1", "news").await.expect("get news"), None);
        assert_eq!(repo.get("u1", "tech").await.expect("get tech").as_deref(), Some("http://b"));
    }

    #[tokio::test]
    async fn subscriptions_are_scoped_per_user() {
        let pool = setup().await;
        let repo = SqlSubscriptionRepository::new(pool);

        repo.upsert("u1", "news", "http://a").await.expect("u1 upsert");
        repo.upsert("u2", "news", "http://b").await.expect("u2 upsert");

        assert_eq!(repo.get("u1", "news").await.expect("u1 get").as_deref(), Some("http://a"));
        assert_eq!(repo.get("u2", "news").await.expect("u2 get").as_deref(), Some("http://b"));

        let u1_subs = repo.list_all("u1").await.expect("u1 list");
        assert_eq!(u1_subs.len(), 1);
        assert_eq!(u1_subs[0].user_id, "u1");
    }

    #[tokio::test]
    async fn list_all_preserves_insertion_order() {
        let pool = setup().await;
        let repo = SqlSubscriptionRepository::new(pool);

        repo.upsert("u1", "zebra", "http://z").await.expect("upsert zebra");
        repo.upsert("u1", "apple", "http://a").await.expect("upsert apple");

        let subs = repo.list_all("u1").await.expect("list");
        let aliases: Vec<&str> = subs.iter().map(|s| s.alias.as_str()).collect();
        assert_eq!(aliases, vec!["zebra", "apple"]);
    }
}
