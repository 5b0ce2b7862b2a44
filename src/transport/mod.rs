pub mod telegram;

use crate::db::sqlite::models::subscription::RecipientId;
use crate::error::TransportError;
use async_trait::async_trait;
use tracing::warn;

pub use telegram::TelegramTransport;

/// Commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    Notify,
    Help,
    Start,
}

impl Command {
    /// Recognises `/status`, `/notify`, `/help` and `/start`, optionally addressed
    /// as `/status@SomeBot`. Arguments after the command are ignored.
    pub fn parse(text: &str) -> Option<Command> {
        let token = text.split_whitespace().next()?;
        let name = token.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name.to_lowercase().as_str() {
            "status" => Some(Command::Status),
            "notify" => Some(Command::Notify),
            "help" => Some(Command::Help),
            "start" => Some(Command::Start),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundCommand {
    pub recipient: RecipientId,
    pub command: Command,
}

/// Chat transport: outbound messages and inbound commands.
#[async_trait]
pub trait MessageTransport {
    /// `rich` asks the transport to render the HTML subset used in our messages.
    async fn send_message(
        &self,
        recipient: RecipientId,
        text: &str,
        rich: bool,
    ) -> Result<(), TransportError>;

    /// Waits for the next batch of inbound commands. May return an empty batch.
    async fn poll_commands(&self) -> Result<Vec<InboundCommand>, TransportError>;
}

/// Sends `text` as rich text, resending it as plain text if the markup is rejected.
pub async fn send_with_fallback(
    transport: &(dyn MessageTransport + Send + Sync),
    recipient: RecipientId,
    text: &str,
) -> Result<(), TransportError> {
    match transport.send_message(recipient, text, true).await {
        Err(TransportError::Formatting(reason)) => {
            warn!(
                "Rich message to {} rejected ({}), falling back to plain text",
                recipient, reason
            );
            transport
                .send_message(recipient, &strip_html(text), false)
                .await
        }
        other => other,
    }
}

/// Removes tags and decodes the entities our messages use.
pub fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;

    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
