use crate::db::sqlite::sqlite_service::SqliteService;
use crate::env_config::models::app_setting::AppSettings;
use crate::price_source::PriceSource;
use crate::transport::MessageTransport;

use std::sync::Arc;

pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub sqlite_service: Arc<SqliteService>,
    pub price_source: Arc<dyn PriceSource + Send + Sync>,
    pub transport: Arc<dyn MessageTransport + Send + Sync>,
}

impl AppState {
    pub fn new(
        settings: Arc<AppSettings>,
        sqlite_service: Arc<SqliteService>,
        price_source: Arc<dyn PriceSource + Send + Sync>,
        transport: Arc<dyn MessageTransport + Send + Sync>,
    ) -> Self {
        Self {
            settings,
            sqlite_service,
            price_source,
            transport,
        }
    }
}
