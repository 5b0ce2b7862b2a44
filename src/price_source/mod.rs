pub mod coingecko;

use crate::error::PriceSourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use coingecko::CoinGeckoClient;

/// One sample of a historical price series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Remote source of spot and historical prices for a single asset.
#[async_trait]
pub trait PriceSource {
    async fn current_price(&self) -> Result<f64, PriceSourceError>;

    /// Samples between `from` and `to`, oldest first
    async fn historical_prices(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, PriceSourceError>;
}
