use crate::db::sqlite::connection::SqliteConnection;
use crate::db::sqlite::repository::reading_repository::{
    StructReadingRepository, TraitReadingRepository,
};
use crate::db::sqlite::repository::subscription_repository::{
    StructSubscriptionRepository, TraitSubscriptionRepository,
};
use crate::env_config::models::app_setting::AppSettings;
use std::sync::Arc;
use tracing::{error, info};

pub struct SqliteService {
    // Connection
    pub connection: Arc<SqliteConnection>,

    // Repositories
    pub repository_reading: Arc<dyn TraitReadingRepository + Send + Sync>,
    pub repository_subscription: Arc<dyn TraitSubscriptionRepository + Send + Sync>,
}

impl SqliteService {
    pub async fn new(settings: &Arc<AppSettings>) -> Result<Self, sqlx::Error> {
        info!("Initializing SQLite service components");

        let sqlite_connection = match SqliteConnection::new(settings.clone()).await {
            Ok(conn) => {
                info!("SQLite connection established successfully");
                Arc::new(conn)
            }
            Err(e) => {
                error!("Failed to establish SQLite connection: {}", e);
                return Err(e);
            }
        };

        Ok(Self::from_connection(sqlite_connection))
    }

    pub fn from_connection(connection: Arc<SqliteConnection>) -> Self {
        info!("Initializing repositories");

        let reading_repository = Arc::new(StructReadingRepository::new(connection.clone()))
            as Arc<dyn TraitReadingRepository + Send + Sync>;

        let subscription_repository =
            Arc::new(StructSubscriptionRepository::new(connection.clone()))
                as Arc<dyn TraitSubscriptionRepository + Send + Sync>;

        Self {
            connection,
            repository_reading: reading_repository,
            repository_subscription: subscription_repository,
        }
    }
}
