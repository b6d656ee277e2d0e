use crate::config::AppConfig;
use crate::users::repo::{InMemoryUserRepository, PgUserRepository, UserRepository};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Builds state from the environment. Returns the pool too so `main` can migrate it.
    pub async fn init() -> anyhow::Result<(Self, Option<PgPool>)> {
        let config = Arc::new(AppConfig::from_env()?);

        let Some(db_config) = config.db.clone() else {
            tracing::warn!("DATABASE_URL not set; users are kept in memory only");
            return Ok((Self::from_parts(Arc::new(InMemoryUserRepository::new()), config), None));
        };

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .connect(&db_config.url)
            .await
            .context("connect to database")?;

        let users = Arc::new(PgUserRepository::new(db.clone())) as Arc<dyn UserRepository>;
        Ok((Self::from_parts(users, config), Some(db)))
    }

    pub fn from_parts(users: Arc<dyn UserRepository>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        let config = Arc::new(AppConfig {
            db: None,
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(Arc::new(InMemoryUserRepository::new()), config)
    }
}
