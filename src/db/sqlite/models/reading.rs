use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `readings` table
#[derive(Debug, Clone, FromRow)]
pub struct DbReading {
    pub recorded_at_ms: i64,
    pub indicator: f64,
    pub price: f64,
    pub moving_average: f64,
}

/// One Mayer Multiple observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub indicator: f64,
    pub price: f64,
    pub moving_average: f64,
}

impl Reading {
    /// Derives the indicator from price and average. The timestamp is cut to
    /// milliseconds, the precision of the store.
    pub fn new(timestamp: DateTime<Utc>, price: f64, moving_average: f64) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(3),
            indicator: price / moving_average,
            price,
            moving_average,
        }
    }
}

impl From<DbReading> for Reading {
    fn from(row: DbReading) -> Self {
        Self {
            timestamp: DateTime::<Utc>::from_timestamp_millis(row.recorded_at_ms)
                .unwrap_or_default(),
            indicator: row.indicator,
            price: row.price,
            moving_average: row.moving_average,
        }
    }
}

impl From<&Reading> for DbReading {
    fn from(reading: &Reading) -> Self {
        Self {
            recorded_at_ms: reading.timestamp.timestamp_millis(),
            indicator: reading.indicator,
            price: reading.price,
            moving_average: reading.moving_average,
        }
    }
}
