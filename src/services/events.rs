// File: src/services/events.rs
use crate::app_state::models::AppState;
use crate::services::commands::handlers::CommandHandlers;
use crate::services::notifications::dispatcher::NotificationDispatcher;
use crate::transport::InboundCommand;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Всё, на что реагирует цикл событий
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Tick,
    Command(InboundCommand),
}

/// Обрабатывает события по одному. Останавливается, когда закрыты все отправители
/// или пришёл сигнал `shutdown`; начатое событие всегда доводится до конца
pub async fn run_event_loop(
    app_state: Arc<AppState>,
    mut events: mpsc::Receiver<Event>,
    mut shutdown: watch::Receiver<bool>,
) {
    let dispatcher = NotificationDispatcher::new(app_state.clone());
    let handlers = CommandHandlers::new(app_state);

    loop {
        // Сигнал остановки проверяется только между событиями
        let event = tokio::select! {
            biased;
            _ = shutdown.changed() => {
                info!("Shutdown requested, event loop stopped");
                return;
            }
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            Event::Tick => {
                let outcome = dispatcher.run_tick().await;
                info!("Scheduled check finished: {:?}", outcome);
            }
            Event::Command(inbound) => handlers.handle(inbound).await,
        }
    }

    info!("Event channel closed, event loop stopped");
}

/// Опрашивает транспорт и передаёт команды в цикл событий
pub fn spawn_command_poller(
    app_state: Arc<AppState>,
    events: mpsc::Sender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting command poller");
        loop {
            match app_state.transport.poll_commands().await {
                Ok(commands) => {
                    for inbound in commands {
                        if events.send(Event::Command(inbound)).await.is_err() {
                            info!("Event loop closed, stopping command poller");
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!("Polling for commands failed: {}", e);
                    tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                }
            }
        }
    })
}
