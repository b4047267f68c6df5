use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use feedhorn_core::config::{AppConfig, ConfigError, LoadOptions};
use feedhorn_db::repositories::SqlSubscriptionRepository;
use feedhorn_db::{connect_with_settings, migrations, DbPool};
use feedhorn_feed::RssFetcher;
use feedhorn_slack::commands::CommandRouter;
use feedhorn_slack::verify::SignatureVerifier;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let verifier = Arc::new(SignatureVerifier::from_config(&config.slack));
    let fetcher = RssFetcher::new(Duration::from_secs(config.feed.fetch_timeout_secs))
        .map_err(BootstrapError::HttpClient)?;
    let command_router = Arc::new(CommandRouter::new(
        Arc::new(SqlSubscriptionRepository::new(db_pool.clone())),
        Arc::new(fetcher),
        config.feed.default_url.clone(),
    ));

    let router = crate::webhook::router(verifier, command_router)
        .merge(crate::health::router(db_pool.clone()));

    Ok(Application { config, db_pool, router })
}

#[cfg(test)]
mod tests {
    use feedhorn_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn overrides_with_secret(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                signing_secret: Some("test-secret".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_a_signing_secret() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                verification_enabled: Some(true),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("slack.signing_secret"));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_exposes_the_schema() {
        let app = bootstrap(overrides_with_secret("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'subscription'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected subscription table to be available after bootstrap");
        assert_eq!(table_count, 1, "bootstrap should expose the subscription table");

        app.db_pool.close().await;
    }
}
