// File: src/services/indicators/evaluator.rs
use super::calculator::MayerCalculator;
use super::classifier::{Classification, SignalClassifier, Thresholds};
use crate::app_state::models::AppState;
use crate::db::sqlite::models::reading::Reading;
use crate::error::IndicatorError;
use std::sync::Arc;
use tracing::info;

/// Свежее показание вместе с его классификацией
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub reading: Reading,
    pub classification: Classification,
}

/// Считает индикатор и классифицирует его по сохранённой истории
pub struct SignalEvaluator {
    app_state: Arc<AppState>,
    calculator: MayerCalculator,
    classifier: SignalClassifier,
}

impl SignalEvaluator {
    pub fn new(app_state: Arc<AppState>) -> Self {
        let thresholds = Thresholds::from(&app_state.settings.app_config.indicator);

        Self {
            calculator: MayerCalculator::new(app_state.clone()),
            classifier: SignalClassifier::new(thresholds),
            app_state,
        }
    }

    /// Расчёт, затем классификация. История уже содержит только что сохранённое показание
    pub async fn evaluate(&self) -> Result<Evaluation, IndicatorError> {
        let reading = self.calculator.compute().await?;

        // Последние показания для проверки устойчивого превышения
        let history = self
            .app_state
            .sqlite_service
            .repository_reading
            .recent(self.classifier.thresholds().sustain_window)
            .await?;

        let classification = self.classifier.classify(Some(reading.indicator), &history);

        info!(
            "Signal {} for Mayer Multiple {:.4}",
            classification.signal, reading.indicator
        );

        Ok(Evaluation {
            reading,
            classification,
        })
    }

    /// Все ли последние `days` сохранённых показаний выше верхнего порога
    pub async fn check_sustain(&self, days: usize) -> Result<bool, sqlx::Error> {
        let history = self
            .app_state
            .sqlite_service
            .repository_reading
            .recent(days)
            .await?;

        // То же правило, что и для SELL, но с другим окном
        let classifier = SignalClassifier::new(Thresholds {
            sustain_window: days,
            ..*self.classifier.thresholds()
        });

        Ok(classifier.sustained_above(&history))
    }
}
