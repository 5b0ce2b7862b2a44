use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Chat identity of a recipient, as issued by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipientId(pub i64);

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row of the `subscriptions` table
#[derive(Debug, Clone, FromRow)]
pub struct DbSubscription {
    pub chat_id: i64,
    pub enabled: bool,
    pub last_notified_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub recipient: RecipientId,
    pub enabled: bool,
    pub last_notified: Option<DateTime<Utc>>,
}

impl From<DbSubscription> for Subscription {
    fn from(row: DbSubscription) -> Self {
        Self {
            recipient: RecipientId(row.chat_id),
            enabled: row.enabled,
            last_notified: row
                .last_notified_ms
                .and_then(DateTime::<Utc>::from_timestamp_millis),
        }
    }
}
