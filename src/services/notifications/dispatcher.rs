// File: src/services/notifications/dispatcher.rs
use crate::app_state::models::AppState;
use crate::error::TransportError;
use crate::services::indicators::classifier::Signal;
use crate::services::indicators::evaluator::SignalEvaluator;
use crate::services::messages;
use crate::transport::send_with_fallback;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Итог одной плановой проверки
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Расчёт не удался, ничего не классифицировано и не отправлено
    Skipped,
    /// Сигнал не требует действий, рассылки нет
    Quiet(Signal),
    /// Сигнал есть, но список подписчиков прочитать не удалось
    Undelivered { signal: Signal, reason: String },
    Dispatched {
        signal: Signal,
        delivered: usize,
        failed: usize,
    },
}

pub struct NotificationDispatcher {
    app_state: Arc<AppState>,
    evaluator: SignalEvaluator,
}

impl NotificationDispatcher {
    pub fn new(app_state: Arc<AppState>) -> Self {
        Self {
            evaluator: SignalEvaluator::new(app_state.clone()),
            app_state,
        }
    }

    /// Выполняет одну проверку и рассылает BUY/SELL всем включённым подписчикам.
    /// Ошибка доставки одному получателю не останавливает остальных
    pub async fn run_tick(&self) -> TickOutcome {
        info!("Notifier: starting scheduled Mayer Multiple check");

        // Расчёт и классификация
        let evaluation = match self.evaluator.evaluate().await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                error!("Notifier: failed to calculate Mayer Multiple, skipping tick: {}", e);
                return TickOutcome::Skipped;
            }
        };

        let signal = evaluation.classification.signal;
        if !signal.is_actionable() {
            info!("Notifier: signal {} is not actionable, nothing to send", signal);
            return TickOutcome::Quiet(signal);
        }

        // Получатели рассылки
        let subscriptions = &self.app_state.sqlite_service.repository_subscription;
        let recipients = match subscriptions.list_enabled().await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!("Notifier: failed to load subscribers: {}", e);
                return TickOutcome::Undelivered {
                    signal,
                    reason: e.to_string(),
                };
            }
        };

        info!(
            "Notifier: sending {} signal to {} subscribers",
            signal,
            recipients.len()
        );

        let settings = &self.app_state.settings;
        let tz = settings.app_config.notifier.tz().unwrap_or(chrono_tz::UTC);
        let text = messages::alert_message(&evaluation, settings, tz);

        let mut delivered = 0;
        let mut failed = 0;

        for recipient in recipients {
            match send_with_fallback(self.app_state.transport.as_ref(), recipient, &text).await {
                Ok(()) => {
                    delivered += 1;
                    if let Err(e) = subscriptions.mark_notified(recipient, Utc::now()).await {
                        warn!("Notifier: failed to record notification for {}: {}", recipient, e);
                    }
                }
                Err(TransportError::Unreachable(reason)) => {
                    failed += 1;
                    // Бот заблокирован или чат удалён: больше не рассылаем этому получателю
                    warn!(
                        "Notifier: {} is unreachable ({}), disabling notifications",
                        recipient, reason
                    );
                    if let Err(e) = subscriptions.set_enabled(recipient, false).await {
                        warn!("Notifier: failed to disable {}: {}", recipient, e);
                    }
                }
                Err(e) => {
                    failed += 1;
                    warn!("Notifier: failed to notify {}: {}", recipient, e);
                }
            }
        }

        info!(
            "Notifier: {} signal delivered to {}, failed for {}",
            signal, delivered, failed
        );

        TickOutcome::Dispatched {
            signal,
            delivered,
            failed,
        }
    }
}
