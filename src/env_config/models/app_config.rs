use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub log: LogConfig,
    pub sqlite: SqliteConfig,
    pub price_source: PriceSourceConfig,
    #[serde(default)]
    pub indicator: IndicatorConfig,
    pub notifier: NotifierConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize)]
pub struct SqliteConfig {
    pub timeout: u64,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct PriceSourceConfig {
    pub base_url: String,
    pub coin_id: String,
    pub vs_currency: String,
    /// Ticker shown in messages
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Length of the requested history range. Must cover `indicator.window` daily samples.
    pub history_days: i64,
    pub request_timeout_seconds: u64,
}

fn default_symbol() -> String {
    "BTC".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    pub window: usize,
    pub low_threshold: f64,
    pub high_threshold: f64,
    /// Number of most recent readings that must all exceed `high_threshold` for SELL.
    /// One reading per daily tick is assumed, so this reads as "days".
    pub sustain_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            window: 200,
            low_threshold: 1.0,
            high_threshold: 2.4,
            sustain_window: 7,
        }
    }
}

impl IndicatorConfig {
    /// Rejects settings under which the classifier would misbehave
    pub fn validate(&self) -> Result<(), String> {
        if self.window == 0 {
            return Err("indicator.window must be at least 1".to_string());
        }
        if self.sustain_window == 0 {
            return Err("indicator.sustain_window must be at least 1".to_string());
        }
        if !self.low_threshold.is_finite() || !self.high_threshold.is_finite() {
            return Err("indicator thresholds must be finite numbers".to_string());
        }
        if self.low_threshold >= self.high_threshold {
            return Err(format!(
                "indicator.low_threshold ({}) must be below high_threshold ({})",
                self.low_threshold, self.high_threshold
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct NotifierConfig {
    pub enabled: bool,
    pub time: String,     // Местное время запуска, формат: "HH:MM:SS"
    pub timezone: String, // IANA, например "Europe/Stockholm"
}

#[derive(Debug, Deserialize)]
pub struct TelegramConfig {
    pub api_url: String,
    /// Long-poll hold time passed to getUpdates
    pub poll_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl NotifierConfig {
    pub fn daily_time(&self) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(&self.time, "%H:%M:%S")
            .map_err(|e| format!("invalid notifier time '{}': {}", self.time, e))
    }

    pub fn tz(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| format!("invalid notifier timezone '{}': {}", self.timezone, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[log]
level = "info"
format = "plain"

[sqlite]
timeout = 5
max_connections = 2

[price_source]
base_url = "https://api.coingecko.com/api/v3"
coin_id = "bitcoin"
vs_currency = "usd"
history_days = 220
request_timeout_seconds = 10

[notifier]
enabled = true
time = "06:00:00"
timezone = "Europe/Stockholm"

[telegram]
api_url = "https://api.telegram.org"
poll_timeout_seconds = 30
request_timeout_seconds = 15
"#;

    #[test]
    fn test_parse_config_with_default_indicator() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.indicator.window, 200);
        assert_eq!(config.indicator.sustain_window, 7);
        assert_eq!(config.indicator.low_threshold, 1.0);
        assert_eq!(config.indicator.high_threshold, 2.4);
        assert_eq!(config.sqlite.max_connections, 2);
        assert_eq!(config.price_source.symbol, "BTC");
    }

    #[test]
    fn test_notifier_schedule_parsing() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(
            config.notifier.daily_time().unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap()
        );
        assert_eq!(config.notifier.tz().unwrap(), chrono_tz::Europe::Stockholm);

        let broken = NotifierConfig {
            enabled: true,
            time: "6am".to_string(),
            timezone: "Mars/Olympus".to_string(),
        };
        assert!(broken.daily_time().is_err());
        assert!(broken.tz().is_err());
    }

    #[test]
    fn test_indicator_validation() {
        assert!(IndicatorConfig::default().validate().is_ok());

        let zero_sustain = IndicatorConfig {
            sustain_window: 0,
            ..IndicatorConfig::default()
        };
        assert!(zero_sustain.validate().unwrap_err().contains("sustain_window"));

        let zero_window = IndicatorConfig {
            window: 0,
            ..IndicatorConfig::default()
        };
        assert!(zero_window.validate().unwrap_err().contains("indicator.window"));

        let inverted = IndicatorConfig {
            low_threshold: 2.4,
            high_threshold: 2.4,
            ..IndicatorConfig::default()
        };
        assert!(inverted.validate().unwrap_err().contains("must be below"));

        let nan = IndicatorConfig {
            high_threshold: f64::NAN,
            ..IndicatorConfig::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_invalid_indicator_section_is_rejected() {
        let content = format!(
            "{}\n[indicator]\nwindow = 200\nlow_threshold = 1.0\nhigh_threshold = 2.4\nsustain_window = 0\n",
            SAMPLE
        );
        let config: AppConfig = toml::from_str(&content).unwrap();
        assert!(config.indicator.validate().is_err());
    }
}
