use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::store::{PgStore, Store};

/// Process-wide state; read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub jwt: JwtKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        Ok(Self::from_parts(
            Arc::new(PgStore::new(db)),
            JwtKeys::from_config(&config.jwt),
        ))
    }

    pub fn from_parts(store: Arc<dyn Store>, jwt: JwtKeys) -> Self {
        Self { store, jwt }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::JwtConfig;
        use crate::store::memory::MemoryStore;

        let jwt = JwtKeys::from_config(&JwtConfig {
            secret: "test".into(),
            ttl_seconds: 300,
        });
        Self::from_parts(Arc::new(MemoryStore::new()), jwt)
    }
}
