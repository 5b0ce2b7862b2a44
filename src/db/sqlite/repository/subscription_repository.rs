use crate::db::sqlite::connection::SqliteConnection;
use crate::db::sqlite::models::subscription::{DbSubscription, RecipientId, Subscription};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait]
pub trait TraitSubscriptionRepository {
    /// Flips the enabled flag, creating an enabled record for unknown recipients.
    /// Returns the new state.
    async fn toggle(&self, recipient: RecipientId) -> Result<bool, SqlxError>;

    /// Creates an enabled record if none exists. Returns true when a record was created.
    async fn ensure_subscribed(&self, recipient: RecipientId) -> Result<bool, SqlxError>;

    /// Inserts or updates the enabled flag
    async fn set_enabled(&self, recipient: RecipientId, enabled: bool) -> Result<(), SqlxError>;

    async fn get(&self, recipient: RecipientId) -> Result<Option<Subscription>, SqlxError>;

    /// All recipients with notifications turned on
    async fn list_enabled(&self) -> Result<Vec<RecipientId>, SqlxError>;

    async fn mark_notified(
        &self,
        recipient: RecipientId,
        at: DateTime<Utc>,
    ) -> Result<(), SqlxError>;
}

pub struct StructSubscriptionRepository {
    connection: Arc<SqliteConnection>,
}

impl StructSubscriptionRepository {
    pub fn new(connection: Arc<SqliteConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TraitSubscriptionRepository for StructSubscriptionRepository {
    async fn toggle(&self, recipient: RecipientId) -> Result<bool, SqlxError> {
        let mut tx = self.connection.get_pool().begin().await?;

        let current = sqlx::query_scalar::<_, bool>(
            "SELECT enabled FROM subscriptions WHERE chat_id = ?",
        )
        .bind(recipient.0)
        .fetch_optional(&mut *tx)
        .await?;

        // Новые подписчики включены по умолчанию
        let new_state = current.map(|enabled| !enabled).unwrap_or(true);

        sqlx::query(
            "INSERT INTO subscriptions (chat_id, enabled) VALUES (?, ?)
             ON CONFLICT (chat_id) DO UPDATE SET enabled = excluded.enabled",
        )
        .bind(recipient.0)
        .bind(new_state)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Notifications for {} toggled to {}", recipient, new_state);

        Ok(new_state)
    }

    async fn ensure_subscribed(&self, recipient: RecipientId) -> Result<bool, SqlxError> {
        let pool = self.connection.get_pool();

        let result = sqlx::query(
            "INSERT INTO subscriptions (chat_id, enabled) VALUES (?, 1)
             ON CONFLICT (chat_id) DO NOTHING",
        )
        .bind(recipient.0)
        .execute(pool)
        .await?;

        let created = result.rows_affected() > 0;
        if created {
            info!("Created default subscription for {}", recipient);
        } else {
            debug!("Subscription for {} already exists", recipient);
        }

        Ok(created)
    }

    async fn set_enabled(&self, recipient: RecipientId, enabled: bool) -> Result<(), SqlxError> {
        let pool = self.connection.get_pool();

        sqlx::query(
            "INSERT INTO subscriptions (chat_id, enabled) VALUES (?, ?)
             ON CONFLICT (chat_id) DO UPDATE SET enabled = excluded.enabled",
        )
        .bind(recipient.0)
        .bind(enabled)
        .execute(pool)
        .await?;

        debug!("Set notifications for {} to {}", recipient, enabled);

        Ok(())
    }

    async fn get(&self, recipient: RecipientId) -> Result<Option<Subscription>, SqlxError> {
        let pool = self.connection.get_pool();

        let row = sqlx::query_as::<_, DbSubscription>(
            "SELECT chat_id, enabled, last_notified_ms FROM subscriptions WHERE chat_id = ?",
        )
        .bind(recipient.0)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Subscription::from))
    }

    async fn list_enabled(&self) -> Result<Vec<RecipientId>, SqlxError> {
        let pool = self.connection.get_pool();

        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT chat_id FROM subscriptions WHERE enabled = 1 ORDER BY chat_id",
        )
        .fetch_all(pool)
        .await?;

        debug!("Found {} enabled subscriptions", ids.len());

        Ok(ids.into_iter().map(RecipientId).collect())
    }

    async fn mark_notified(
        &self,
        recipient: RecipientId,
        at: DateTime<Utc>,
    ) -> Result<(), SqlxError> {
        let pool = self.connection.get_pool();

        sqlx::query("UPDATE subscriptions SET last_notified_ms = ? WHERE chat_id = ?")
            .bind(at.timestamp_millis())
            .bind(recipient.0)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn repository() -> StructSubscriptionRepository {
        StructSubscriptionRepository::new(Arc::new(SqliteConnection::in_memory().await))
    }

    #[tokio::test]
    async fn test_toggle_fresh_recipient_twice() {
        let repo = repository().await;
        let chat = RecipientId(42);

        assert!(repo.toggle(chat).await.unwrap());
        assert!(!repo.toggle(chat).await.unwrap());
        assert!(repo.toggle(chat).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_enabled_filters_disabled() {
        let repo = repository().await;
        repo.set_enabled(RecipientId(123), true).await.unwrap();
        repo.set_enabled(RecipientId(456), false).await.unwrap();

        assert_eq!(repo.list_enabled().await.unwrap(), vec![RecipientId(123)]);
    }

    #[tokio::test]
    async fn test_ensure_subscribed_does_not_flip_existing() {
        let repo = repository().await;
        let chat = RecipientId(7);

        assert!(repo.ensure_subscribed(chat).await.unwrap());
        assert!(!repo.ensure_subscribed(chat).await.unwrap());
        assert!(repo.get(chat).await.unwrap().unwrap().enabled);

        // Отключённого пользователя /start не включает обратно
        repo.set_enabled(chat, false).await.unwrap();
        assert!(!repo.ensure_subscribed(chat).await.unwrap());
        assert!(!repo.get(chat).await.unwrap().unwrap().enabled);
    }

    #[tokio::test]
    async fn test_mark_notified_sets_timestamp() {
        let repo = repository().await;
        let chat = RecipientId(-100_200_300);
        repo.ensure_subscribed(chat).await.unwrap();
        assert_eq!(repo.get(chat).await.unwrap().unwrap().last_notified, None);

        let at = Utc.with_ymd_and_hms(2025, 6, 1, 4, 0, 0).unwrap();
        repo.mark_notified(chat, at).await.unwrap();

        let sub = repo.get(chat).await.unwrap().unwrap();
        assert_eq!(sub.last_notified, Some(at));
        assert_eq!(sub.recipient, chat);
    }

    #[tokio::test]
    async fn test_get_unknown_recipient() {
        let repo = repository().await;
        assert!(repo.get(RecipientId(1)).await.unwrap().is_none());
        assert!(repo.list_enabled().await.unwrap().is_empty());
    }
}
