// File: src/services/commands/handlers.rs
use crate::app_state::models::AppState;
use crate::db::sqlite::models::subscription::RecipientId;
use crate::services::indicators::evaluator::SignalEvaluator;
use crate::services::messages;
use crate::transport::{Command, InboundCommand, send_with_fallback};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct CommandHandlers {
    app_state: Arc<AppState>,
    evaluator: SignalEvaluator,
}

impl CommandHandlers {
    pub fn new(app_state: Arc<AppState>) -> Self {
        Self {
            evaluator: SignalEvaluator::new(app_state.clone()),
            app_state,
        }
    }

    /// Готовит ответ на команду и отправляет его. Ошибки доставки только логируются
    pub async fn handle(&self, inbound: InboundCommand) {
        let InboundCommand { recipient, command } = inbound;
        info!("Handling {:?} from {}", command, recipient);

        let reply = match command {
            Command::Status => self.status(recipient).await,
            Command::Notify => self.notify(recipient).await,
            Command::Help => self.help(recipient),
            Command::Start => self.start(recipient).await,
        };

        if let Err(e) = send_with_fallback(self.app_state.transport.as_ref(), recipient, &reply).await
        {
            warn!("Failed to reply to {} for {:?}: {}", recipient, command, e);
        }
    }

    /// Свежий расчёт и классификация плюс состояние уведомлений получателя
    pub async fn status(&self, recipient: RecipientId) -> String {
        let evaluation = match self.evaluator.evaluate().await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                error!("Status for {} failed: {}", recipient, e);
                return messages::CALCULATION_FAILED.to_string();
            }
        };

        let settings = &self.app_state.settings;
        let tz = settings.app_config.notifier.tz().unwrap_or(chrono_tz::UTC);
        let snapshot = messages::status_message(&evaluation, settings, tz);

        // Подписка читается отдельно: её ошибка не портит основной ответ
        let subscriptions = &self.app_state.sqlite_service.repository_subscription;
        let subscription = match subscriptions.get(recipient).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!("Failed to load subscription for {}: {}", recipient, e);
                return snapshot;
            }
        };

        if let Some(sub) = &subscription {
            debug!("Subscription of {}: enabled={}", sub.recipient, sub.enabled);
        }

        format!(
            "{}\n\n{}",
            snapshot,
            messages::subscription_line(subscription.as_ref(), tz)
        )
    }

    pub async fn notify(&self, recipient: RecipientId) -> String {
        let subscriptions = &self.app_state.sqlite_service.repository_subscription;
        match subscriptions.toggle(recipient).await {
            Ok(enabled) => messages::notify_toggled_message(enabled).to_string(),
            Err(e) => {
                error!("Failed to toggle notifications for {}: {}", recipient, e);
                "❌ Could not update notification settings, please try again later".to_string()
            }
        }
    }

    pub fn help(&self, _recipient: RecipientId) -> String {
        messages::help_message(&self.app_state.settings)
    }

    /// Подписывает нового пользователя и отвечает справкой
    pub async fn start(&self, recipient: RecipientId) -> String {
        let subscriptions = &self.app_state.sqlite_service.repository_subscription;
        if let Err(e) = subscriptions.ensure_subscribed(recipient).await {
            error!("Failed to register {}: {}", recipient, e);
        }
        self.help(recipient)
    }
}
