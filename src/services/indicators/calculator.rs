// File: src/services/indicators/calculator.rs
use crate::app_state::models::AppState;
use crate::db::sqlite::models::reading::Reading;
use crate::error::IndicatorError;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Считает Mayer Multiple (текущая цена / скользящая средняя) и сохраняет
/// каждое успешное показание
pub struct MayerCalculator {
    app_state: Arc<AppState>,
    window_size: usize,
    history_days: i64,
}

impl MayerCalculator {
    pub fn new(app_state: Arc<AppState>) -> Self {
        let config = &app_state.settings.app_config;
        let window_size = config.indicator.window;
        let history_days = config.price_source.history_days;

        Self {
            app_state,
            window_size,
            history_days,
        }
    }

    pub async fn compute(&self) -> Result<Reading, IndicatorError> {
        let source = &self.app_state.price_source;

        // Текущая цена
        let price = source.current_price().await.map_err(|e| {
            error!("Error fetching current price: {}", e);
            IndicatorError::from(e)
        })?;

        // История цен за окно скользящей средней
        let now = Utc::now();
        let from = now - Duration::days(self.history_days);
        let history = source.historical_prices(from, now).await.map_err(|e| {
            error!("Error fetching price history: {}", e);
            IndicatorError::from(e)
        })?;

        // Скользящая средняя по последним `window` точкам
        let prices: Vec<f64> = history.iter().map(|p| p.price).collect();
        let moving_average = calculate_sma(&prices, self.window_size).ok_or_else(|| {
            warn!(
                "Not enough historical data for {}-sample MA: got {}",
                self.window_size,
                prices.len()
            );
            IndicatorError::InsufficientHistory {
                got: prices.len(),
                need: self.window_size,
            }
        })?;

        // Нулевая или битая средняя даёт бессмысленный индикатор
        if !moving_average.is_finite() || moving_average <= 0.0 {
            return Err(IndicatorError::DataSourceUnavailable(format!(
                "non-positive moving average {}",
                moving_average
            )));
        }

        debug!(
            "Price {:.2}, {}-sample MA {:.2} from {} samples ({:?} .. {:?})",
            price,
            self.window_size,
            moving_average,
            prices.len(),
            history.first().map(|p| p.timestamp),
            history.last().map(|p| p.timestamp)
        );

        // Сохранение показания
        let reading = Reading::new(now, price, moving_average);

        self.app_state
            .sqlite_service
            .repository_reading
            .insert(&reading)
            .await?;

        info!(
            "Mayer Multiple {:.4} (price {:.2}, MA {:.2})",
            reading.indicator, reading.price, reading.moving_average
        );

        Ok(reading)
    }
}

/// Вычисляет простую скользящую среднюю (SMA) по последним `period` значениям
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let tail = &prices[prices.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}
