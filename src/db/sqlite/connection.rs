use crate::db::sqlite::schema;
use crate::env_config::models::app_setting::AppSettings;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Pool over the single SQLite file. Every repository call checks out a connection
/// for the duration of one statement or transaction and returns it on drop.
#[derive(Clone)]
pub struct SqliteConnection {
    pool: SqlitePool,
}

impl SqliteConnection {
    pub async fn new(settings: Arc<AppSettings>) -> Result<Self, sqlx::Error> {
        info!(
            "Initializing SQLite connection at {}...",
            settings.app_env.db_path
        );

        let timeout = Duration::from_secs(settings.app_config.sqlite.timeout);

        let options = SqliteConnectOptions::new()
            .filename(&settings.app_env.db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.app_config.sqlite.max_connections)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Verifies the pool and creates the schema if it is missing.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        debug!("Executing test query on SQLite");
        match sqlx::query("SELECT 1").execute(&pool).await {
            Ok(_) => info!("SQLite connection successful"),
            Err(e) => {
                error!("Failed to connect to SQLite: {}", e);
                return Err(e);
            }
        }

        schema::migrate(&pool).await?;

        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
impl SqliteConnection {
    /// A private in-memory database. One connection without expiry keeps the
    /// database alive for the whole test.
    pub async fn in_memory() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        Self::from_pool(pool).await.unwrap()
    }
}
