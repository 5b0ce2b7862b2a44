// File: src/services/indicators/classifier.rs
use crate::db::sqlite::models::reading::Reading;
use crate::env_config::models::app_config::IndicatorConfig;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Watching,
    Hold,
    /// Значение индикатора недоступно, классификации нет
    Error,
}

impl Signal {
    /// Подписчикам рассылаются только BUY и SELL
    pub fn is_actionable(&self) -> bool {
        matches!(self, Signal::Buy | Signal::Sell)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Watching => write!(f, "WATCHING"),
            Signal::Hold => write!(f, "HOLD"),
            Signal::Error => write!(f, "ERROR"),
        }
    }
}

/// Границы строгие: значение, равное порогу, это HOLD
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub low: f64,
    pub high: f64,
    /// Сколько последних показаний должны быть выше `high` для SELL
    pub sustain_window: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&IndicatorConfig::default())
    }
}

impl From<&IndicatorConfig> for Thresholds {
    fn from(config: &IndicatorConfig) -> Self {
        Self {
            low: config.low_threshold,
            high: config.high_threshold,
            sustain_window: config.sustain_window,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub message: String,
    pub signal: Signal,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SignalClassifier {
    thresholds: Thresholds,
}

impl SignalClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Классифицирует `current` по порогам. `history` может быть в любом порядке
    /// и любой длины, учитываются только `sustain_window` самых свежих показаний
    pub fn classify(&self, current: Option<f64>, history: &[Reading]) -> Classification {
        let Thresholds {
            low,
            high,
            sustain_window,
        } = self.thresholds;

        let value = match current {
            Some(value) if value.is_finite() => value,
            _ => {
                return Classification {
                    message: "ERROR: Could not calculate Mayer Multiple".to_string(),
                    signal: Signal::Error,
                };
            }
        };

        // BUY не зависит от истории
        if value < low {
            return Classification {
                message: format!("🚀 BUY SIGNAL: Mayer Multiple is below {:.1}", low),
                signal: Signal::Buy,
            };
        }

        if value > high {
            if self.sustained_above(history) {
                return Classification {
                    message: format!(
                        "📉 SELL SIGNAL: Mayer Multiple has been above {:.1} for {} consecutive days",
                        high, sustain_window
                    ),
                    signal: Signal::Sell,
                };
            }

            // Сколько из последних показаний уже выше порога
            let above = self
                .latest(history)
                .iter()
                .filter(|r| r.indicator > high)
                .count();

            return Classification {
                message: format!(
                    "👀 WATCHING: Mayer Multiple is {:.2}, above {:.1} for {}/{} days",
                    value, high, above, sustain_window
                ),
                signal: Signal::Watching,
            };
        }

        Classification {
            message: format!("⏳ HOLD: Mayer Multiple is {:.2}", value),
            signal: Signal::Hold,
        }
    }

    /// Есть не меньше `sustain_window` показаний, и все самые свежие из них выше верхнего порога
    pub fn sustained_above(&self, history: &[Reading]) -> bool {
        let latest = self.latest(history);
        latest.len() >= self.thresholds.sustain_window
            && latest.iter().all(|r| r.indicator > self.thresholds.high)
    }

    fn latest<'a>(&self, history: &'a [Reading]) -> Vec<&'a Reading> {
        let mut sorted: Vec<&Reading> = history.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted.truncate(self.thresholds.sustain_window);
        sorted
    }
}
