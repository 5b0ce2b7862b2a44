mod app_state;
mod db;
mod env_config;
mod error;
mod logger;
mod price_source;
mod services;
mod transport;

#[cfg(test)]
mod test_support;

use app_state::models::AppState;
use db::sqlite::sqlite_service::SqliteService;
use env_config::models::{app_config::AppConfig, app_env::AppEnv, app_setting::AppSettings};
use price_source::{CoinGeckoClient, PriceSource};
use services::events::{self, Event};
use services::indicators::evaluator::SignalEvaluator;
use services::notifications::scheduler::DailyScheduler;
use std::sync::Arc;
use tokio::{
    signal,
    sync::{mpsc, watch},
};
use tracing::{debug, error, info, warn};
use transport::{MessageTransport, TelegramTransport};

const EVENT_QUEUE_CAPACITY: usize = 64;

#[tokio::main]
async fn main() {
    // Инициализация приложения
    let settings: Arc<AppSettings> = Arc::new(initialize_application());

    // Подключение к базе данных
    let sqlite_service = initialize_database(settings.clone()).await;

    // Внешние клиенты: источник цен и Telegram
    let (price_source, transport) = initialize_clients(&settings);

    // Создание глобального состояния приложения
    let app_state: Arc<AppState> = Arc::new(AppState::new(
        settings.clone(),
        Arc::new(sqlite_service),
        price_source,
        transport,
    ));

    log_stored_state(&app_state).await;

    // Тики планировщика и команды пользователей идут через одну очередь
    let (events_tx, events_rx) = mpsc::channel::<Event>(EVENT_QUEUE_CAPACITY);

    let scheduler = DailyScheduler::new(app_state.clone());
    let scheduler_task = scheduler.start(events_tx.clone());
    let poller_task = events::spawn_command_poller(app_state.clone(), events_tx);

    info!("Application started successfully!");

    // Цикл событий в отдельной задаче: по Ctrl-C он доделывает текущее событие
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut event_loop = tokio::spawn(events::run_event_loop(
        app_state.clone(),
        events_rx,
        shutdown_rx,
    ));

    let interrupted = tokio::select! {
        _ = &mut event_loop => false,
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(err) => error!("Failed to listen for shutdown signal: {}", err),
            }
            true
        }
    };

    // Новые события больше не поступают
    poller_task.abort();
    if let Some(task) = scheduler_task {
        task.abort();
    }

    if interrupted {
        if shutdown_tx.send(true).is_err() {
            debug!("Event loop already stopped");
        }
        if let Err(err) = event_loop.await {
            error!("Event loop task failed: {}", err);
        }
    } else {
        error!("Event loop exited unexpectedly");
    }

    app_state.sqlite_service.connection.get_pool().close().await;

    info!("Application stopped");
}

/// Инициализирует настройки и логирование приложения
fn initialize_application() -> AppSettings {
    // .env необязателен: в проде переменные задаются окружением
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let environment = AppEnv::new();
    let config = AppConfig::new(&environment.env);
    let app_settings = AppSettings {
        app_config: config,
        app_env: environment,
    };

    logger::init_logger(
        &app_settings.app_config.log.level,
        &app_settings.app_config.log.format,
        !app_settings.app_env.is_local(),
    )
    .expect("Failed to initialize logger");

    info!("Starting Mayer Multiple Monitor...");
    info!("Current environment: {}", app_settings.app_env.env);

    if app_settings.app_env.is_local() {
        info!("Running in local development mode (.env loaded: {})", dotenv_loaded);
        debug!("Configuration details: {:#?}", app_settings);
    } else {
        info!("Running in production mode");
    }

    app_settings
}

/// Открывает SQLite и создаёт схему
async fn initialize_database(settings: Arc<AppSettings>) -> SqliteService {
    info!("Initializing database connection...");

    match SqliteService::new(&settings).await {
        Ok(service) => {
            info!("SQLite store ready at {}", settings.app_env.db_path);
            service
        }
        Err(err) => {
            error!("Failed to open SQLite store: {}", err);
            panic!("Cannot continue without the SQLite store");
        }
    }
}

fn initialize_clients(
    settings: &AppSettings,
) -> (
    Arc<dyn PriceSource + Send + Sync>,
    Arc<dyn MessageTransport + Send + Sync>,
) {
    let price_source = match CoinGeckoClient::new(
        &settings.app_config.price_source,
        settings.app_env.coingecko_api_key.clone(),
    ) {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to build CoinGecko client: {}", err);
            panic!("Cannot continue without a price source");
        }
    };

    let transport = match TelegramTransport::new(
        &settings.app_config.telegram,
        &settings.app_env.telegram_bot_token,
    ) {
        Ok(transport) => transport,
        Err(err) => {
            error!("Failed to build Telegram transport: {}", err);
            panic!("Cannot continue without a message transport");
        }
    };

    (Arc::new(price_source), Arc::new(transport))
}

/// Сводка по сохранённой истории при старте
async fn log_stored_state(app_state: &Arc<AppState>) {
    let days = app_state.settings.app_config.indicator.sustain_window;
    let evaluator = SignalEvaluator::new(app_state.clone());

    match evaluator.check_sustain(days).await {
        Ok(sustained) => info!(
            "Last {} stored readings above {}: {}",
            days, app_state.settings.app_config.indicator.high_threshold, sustained
        ),
        Err(err) => warn!("Could not read stored readings: {}", err),
    }
}
