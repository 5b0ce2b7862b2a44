//! Fakes and builders shared by the unit tests.

use crate::app_state::models::AppState;
use crate::db::sqlite::connection::SqliteConnection;
use crate::db::sqlite::models::subscription::RecipientId;
use crate::db::sqlite::sqlite_service::SqliteService;
use crate::env_config::models::app_config::{
    AppConfig, IndicatorConfig, LogConfig, NotifierConfig, PriceSourceConfig, SqliteConfig,
    TelegramConfig,
};
use crate::env_config::models::app_env::{AppEnv, Env};
use crate::env_config::models::app_setting::AppSettings;
use crate::error::{PriceSourceError, TransportError};
use crate::price_source::{PricePoint, PriceSource};
use crate::transport::{InboundCommand, MessageTransport};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

pub fn settings_with_db_path(db_path: &str) -> AppSettings {
    AppSettings {
        app_config: AppConfig {
            log: LogConfig {
                level: "debug".to_string(),
                format: "plain".to_string(),
            },
            sqlite: SqliteConfig {
                timeout: 5,
                max_connections: 2,
            },
            price_source: PriceSourceConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                coin_id: "bitcoin".to_string(),
                vs_currency: "usd".to_string(),
                symbol: "BTC".to_string(),
                history_days: 220,
                request_timeout_seconds: 1,
            },
            indicator: IndicatorConfig::default(),
            notifier: NotifierConfig {
                enabled: true,
                time: "06:00:00".to_string(),
                timezone: "Europe/Stockholm".to_string(),
            },
            telegram: TelegramConfig {
                api_url: "http://127.0.0.1:9".to_string(),
                poll_timeout_seconds: 1,
                request_timeout_seconds: 1,
            },
        },
        app_env: AppEnv {
            env: Env::Local,
            telegram_bot_token: "test-token".to_string(),
            db_path: db_path.to_string(),
            coingecko_api_key: None,
        },
    }
}

/// Price source answering from fixed data. `spot: None` simulates an outage.
pub struct FakePriceSource {
    pub spot: Option<f64>,
    pub history: Vec<f64>,
}

impl FakePriceSource {
    pub fn new(spot: Option<f64>, history: Vec<f64>) -> Self {
        Self { spot, history }
    }

    /// Spot price over a flat history, giving `indicator == spot / average`.
    pub fn flat(spot: f64, average: f64, samples: usize) -> Self {
        Self::new(Some(spot), vec![average; samples])
    }
}

#[async_trait]
impl PriceSource for FakePriceSource {
    async fn current_price(&self) -> Result<f64, PriceSourceError> {
        self.spot.ok_or_else(|| PriceSourceError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }

    async fn historical_prices(
        &self,
        _from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, PriceSourceError> {
        let len = self.history.len() as i64;
        Ok(self
            .history
            .iter()
            .enumerate()
            .map(|(i, price)| PricePoint {
                timestamp: to - Duration::days(len - i as i64),
                price: *price,
            })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub recipient: RecipientId,
    pub text: String,
    pub rich: bool,
}

/// Transport that records deliveries. Recipients in `failing` always error,
/// recipients in `blocked` report that they refuse the bot, and with
/// `reject_rich` every rich message is refused as badly formatted.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<SentMessage>>,
    pub failing: HashSet<RecipientId>,
    pub blocked: HashSet<RecipientId>,
    pub reject_rich: bool,
    pub send_delay: Option<std::time::Duration>,
    pub inbound: Mutex<Vec<InboundCommand>>,
}

impl RecordingTransport {
    pub fn failing_for(recipients: &[RecipientId]) -> Self {
        Self {
            failing: recipients.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send_message(
        &self,
        recipient: RecipientId,
        text: &str,
        rich: bool,
    ) -> Result<(), TransportError> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        if self.blocked.contains(&recipient) {
            return Err(TransportError::Unreachable(
                "Forbidden: bot was blocked by the user".to_string(),
            ));
        }
        if self.failing.contains(&recipient) {
            return Err(TransportError::Delivery(format!(
                "chat {} not found",
                recipient
            )));
        }
        if rich && self.reject_rich {
            return Err(TransportError::Formatting(
                "can't parse entities".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(SentMessage {
            recipient,
            text: text.to_string(),
            rich,
        });
        Ok(())
    }

    async fn poll_commands(&self) -> Result<Vec<InboundCommand>, TransportError> {
        let commands = std::mem::take(&mut *self.inbound.lock().unwrap());
        if commands.is_empty() {
            // Stand-in for the long-poll wait
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        Ok(commands)
    }
}

/// App state over a fresh in-memory store.
pub async fn app_state(
    price_source: FakePriceSource,
    transport: Arc<RecordingTransport>,
) -> Arc<AppState> {
    let settings = Arc::new(settings_with_db_path(":memory:"));
    let connection = Arc::new(SqliteConnection::in_memory().await);
    let sqlite_service = Arc::new(SqliteService::from_connection(connection));

    Arc::new(AppState::new(
        settings,
        sqlite_service,
        Arc::new(price_source),
        transport,
    ))
}
