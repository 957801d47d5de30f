use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::users::repo::{PgUserStore, UserStore};
use crate::users::memory::MemoryUserStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users = match &config.database {
            Some(db_cfg) => {
                let db = PgPoolOptions::new()
                    .max_connections(db_cfg.max_connections)
                    .connect(&db_cfg.url)
                    .await
                    .context("connect to database")?;

                // Run migrations if present
                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    warn!(error = %e, "migration failed; continuing");
                }
                info!(max_connections = db_cfg.max_connections, "using postgres user store");
                Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory user store");
                Arc::new(MemoryUserStore::default()) as Arc<dyn UserStore>
            }
        };

        Ok(Self { config, users })
    }

    /// State backed by a fresh in-memory store, no network.
    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database: None,
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self {
            config,
            users: Arc::new(MemoryUserStore::default()),
        }
    }
}
