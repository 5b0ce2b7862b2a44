use crate::db::sqlite::connection::SqliteConnection;
use crate::db::sqlite::models::reading::{DbReading, Reading};
use async_trait::async_trait;
use sqlx::Error as SqlxError;
use std::sync::Arc;
use tracing::{debug, error};

#[async_trait]
pub trait TraitReadingRepository {
    /// Appends a reading keyed by its timestamp
    async fn insert(&self, reading: &Reading) -> Result<(), SqlxError>;

    /// Returns up to `limit` most recent readings, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<Reading>, SqlxError>;
}

pub struct StructReadingRepository {
    connection: Arc<SqliteConnection>,
}

impl StructReadingRepository {
    pub fn new(connection: Arc<SqliteConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TraitReadingRepository for StructReadingRepository {
    async fn insert(&self, reading: &Reading) -> Result<(), SqlxError> {
        let pool = self.connection.get_pool();
        let row = DbReading::from(reading);

        let result = sqlx::query(
            "INSERT INTO readings (recorded_at_ms, indicator, price, moving_average)
             VALUES (?, ?, ?, ?)",
        )
        .bind(row.recorded_at_ms)
        .bind(row.indicator)
        .bind(row.price)
        .bind(row.moving_average)
        .execute(pool)
        .await;

        match result {
            Ok(_) => {
                debug!(
                    "Stored reading at {}: indicator={:.4}",
                    reading.timestamp, reading.indicator
                );
                Ok(())
            }
            Err(e) => {
                error!("Error storing reading at {}: {}", reading.timestamp, e);
                Err(e)
            }
        }
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Reading>, SqlxError> {
        let pool = self.connection.get_pool();

        let rows = sqlx::query_as::<_, DbReading>(
            "SELECT recorded_at_ms, indicator, price, moving_average
             FROM readings
             ORDER BY recorded_at_ms DESC
             LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;

        debug!("Fetched {} recent readings (limit {})", rows.len(), limit);

        Ok(rows.into_iter().map(Reading::from).collect())
    }
}
