use super::{Command, InboundCommand, MessageTransport};
use crate::db::sqlite::models::subscription::RecipientId;
use crate::env_config::models::app_config::TelegramConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Envelope of every Bot API reply
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

/// Telegram Bot API over HTTPS: `sendMessage` out, long-polled `getUpdates` in.
pub struct TelegramTransport {
    client: Client,
    base_url: String,
    poll_timeout_seconds: u64,
    next_offset: AtomicI64,
}

impl TelegramTransport {
    pub fn new(config: &TelegramConfig, token: &str) -> Result<Self, TransportError> {
        // Клиентский таймаут должен покрывать время удержания long-poll запроса
        let client = Client::builder()
            .timeout(Duration::from_secs(
                config.request_timeout_seconds + config.poll_timeout_seconds,
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_url.trim_end_matches('/'), token),
            poll_timeout_seconds: config.poll_timeout_seconds,
            next_offset: AtomicI64::new(0),
        })
    }
}

#[async_trait]
impl MessageTransport for TelegramTransport {
    async fn send_message(
        &self,
        recipient: RecipientId,
        text: &str,
        rich: bool,
    ) -> Result<(), TransportError> {
        let mut body = json!({
            "chat_id": recipient.0,
            "text": text,
            "disable_web_page_preview": true,
        });
        if rich {
            body["parse_mode"] = json!("HTML");
        }

        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let reply: TelegramResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| TransportError::Delivery(format!("status {}: {}", status, e)))?;

        if reply.ok {
            debug!("Delivered message to {}", recipient);
            return Ok(());
        }

        Err(classify_failure(
            reply.error_code,
            reply.description.unwrap_or_default(),
        ))
    }

    async fn poll_commands(&self) -> Result<Vec<InboundCommand>, TransportError> {
        let offset = self.next_offset.load(Ordering::SeqCst);

        let reply: TelegramResponse<Vec<Update>> = self
            .client
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", self.poll_timeout_seconds.to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;

        if !reply.ok {
            return Err(TransportError::Delivery(format!(
                "getUpdates failed: {}",
                reply.description.unwrap_or_default()
            )));
        }

        let updates = reply.result.unwrap_or_default();
        let (commands, next) = commands_from_updates(updates);
        if let Some(next) = next {
            self.next_offset.store(next, Ordering::SeqCst);
        }

        Ok(commands)
    }
}

/// Bot API rejects unparseable markup with 400 "can't parse entities".
fn classify_failure(error_code: Option<i64>, description: String) -> TransportError {
    if error_code == Some(400) && description.contains("can't parse entities") {
        TransportError::Formatting(description)
    } else if error_code == Some(403) || description.contains("chat not found") {
        TransportError::Unreachable(description)
    } else {
        warn!("Telegram error {:?}: {}", error_code, description);
        TransportError::Delivery(format!(
            "telegram error {}: {}",
            error_code.unwrap_or_default(),
            description
        ))
    }
}

/// Extracts known commands and the offset acknowledging every update seen.
fn commands_from_updates(updates: Vec<Update>) -> (Vec<InboundCommand>, Option<i64>) {
    let next_offset = updates.iter().map(|u| u.update_id + 1).max();

    let commands = updates
        .into_iter()
        .filter_map(|update| {
            let message = update.message?;
            let command = Command::parse(message.text.as_deref()?)?;
            Some(InboundCommand {
                recipient: RecipientId(message.chat.id),
                command,
            })
        })
        .collect();

    (commands, next_offset)
}
