use super::{PricePoint, PriceSource};
use crate::env_config::models::app_config::PriceSourceConfig;
use crate::error::PriceSourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// `/simple/price` response: {"bitcoin": {"usd": 97000.0}}
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// `/coins/{id}/market_chart/range` response
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<[f64; 2]>, // [[timestamp_ms, price], ...]
}

/// CoinGecko REST client for one coin quoted in one currency.
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    coin_id: String,
    vs_currency: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(
        config: &PriceSourceConfig,
        api_key: Option<String>,
    ) -> Result<Self, PriceSourceError> {
        let client = Client::builder()
            .user_agent("mayer-monitor/0.1 (Mayer Multiple notifier)")
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            coin_id: config.coin_id.clone(),
            vs_currency: config.vs_currency.clone(),
            api_key,
        })
    }

    fn api_key_header(&self) -> &'static str {
        if self.base_url.contains("pro-api") {
            "x-cg-pro-api-key"
        } else {
            "x-cg-demo-api-key"
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PriceSourceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(query);

        if let Some(ref key) = self.api_key {
            request = request.header(self.api_key_header(), key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("CoinGecko returned {} for {}", status, path);
            return Err(PriceSourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| PriceSourceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn current_price(&self) -> Result<f64, PriceSourceError> {
        let response: SimplePriceResponse = self
            .get_json(
                "/simple/price",
                &[
                    ("ids", self.coin_id.clone()),
                    ("vs_currencies", self.vs_currency.clone()),
                ],
            )
            .await?;

        extract_spot_price(&response, &self.coin_id, &self.vs_currency)
    }

    async fn historical_prices(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, PriceSourceError> {
        let response: MarketChartResponse = self
            .get_json(
                &format!("/coins/{}/market_chart/range", self.coin_id),
                &[
                    ("vs_currency", self.vs_currency.clone()),
                    ("from", from.timestamp().to_string()),
                    ("to", to.timestamp().to_string()),
                ],
            )
            .await?;

        let points = parse_market_chart(response)?;
        debug!(
            "Fetched {} historical prices for {} from {} to {}",
            points.len(),
            self.coin_id,
            from,
            to
        );

        Ok(points)
    }
}

fn extract_spot_price(
    response: &SimplePriceResponse,
    coin_id: &str,
    vs_currency: &str,
) -> Result<f64, PriceSourceError> {
    let price = response
        .get(coin_id)
        .and_then(|quotes| quotes.get(vs_currency))
        .copied()
        .ok_or_else(|| {
            PriceSourceError::Malformed(format!("no {} price for {}", vs_currency, coin_id))
        })?;

    if !price.is_finite() || price <= 0.0 {
        return Err(PriceSourceError::Malformed(format!(
            "non-positive spot price {}",
            price
        )));
    }

    Ok(price)
}

fn parse_market_chart(response: MarketChartResponse) -> Result<Vec<PricePoint>, PriceSourceError> {
    let mut points = Vec::with_capacity(response.prices.len());

    for [timestamp_ms, price] in response.prices {
        if !price.is_finite() || price <= 0.0 {
            return Err(PriceSourceError::Malformed(format!(
                "non-positive historical price {} at {}",
                price, timestamp_ms
            )));
        }

        let timestamp = DateTime::<Utc>::from_timestamp_millis(timestamp_ms as i64)
            .ok_or_else(|| {
                PriceSourceError::Malformed(format!("invalid timestamp {}", timestamp_ms))
            })?;

        points.push(PricePoint { timestamp, price });
    }

    points.sort_by_key(|p| p.timestamp);

    Ok(points)
}
