// File: src/services/messages.rs
use crate::db::sqlite::models::subscription::Subscription;
use crate::env_config::models::app_setting::AppSettings;
use crate::services::indicators::evaluator::Evaluation;
use chrono_tz::Tz;

pub const CALCULATION_FAILED: &str = "❌ Failed to calculate Mayer Multiple";

/// `$97,123.46`
pub fn format_usd(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac_part)
}

/// Общий шаблон: заголовок, время, цена, средняя, индикатор и вывод
fn snapshot(title: &str, evaluation: &Evaluation, settings: &AppSettings, tz: Tz) -> String {
    let reading = &evaluation.reading;
    let config = &settings.app_config;
    let time = reading.timestamp.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S");

    format!(
        "<b>{title}</b>\n\
         Time: {time}\n\
         \n\
         💰 Current {symbol} Price: {price}\n\
         📊 {window}-day MA: {ma}\n\
         📈 Mayer Multiple: {value:.2}\n\
         \n\
         {message}",
        title = title,
        time = time,
        symbol = config.price_source.symbol,
        price = format_usd(reading.price),
        window = config.indicator.window,
        ma = format_usd(reading.moving_average),
        value = reading.indicator,
        message = evaluation.classification.message,
    )
}

/// Ответ на /status
pub fn status_message(evaluation: &Evaluation, settings: &AppSettings, tz: Tz) -> String {
    snapshot("Mayer Multiple Update", evaluation, settings, tz)
}

/// Плановое уведомление BUY/SELL
pub fn alert_message(evaluation: &Evaluation, settings: &AppSettings, tz: Tz) -> String {
    snapshot(
        &format!("🔔 Mayer Multiple Alert: {}", evaluation.classification.signal),
        evaluation,
        settings,
        tz,
    )
}

/// Справка с текущими порогами и временем рассылки
pub fn help_message(settings: &AppSettings) -> String {
    let indicator = &settings.app_config.indicator;
    let notifier = &settings.app_config.notifier;

    format!(
        "<b>Available Commands:</b>\n\
         \n\
         /status - Get current Mayer Multiple status\n\
         /notify - Turn daily BUY/SELL notifications on or off\n\
         /help - Show this help message\n\
         \n\
         <b>Mayer Multiple Rules:</b>\n\
         🚀 BUY when Mayer Multiple &lt; {low:.1}\n\
         📉 SELL when Mayer Multiple &gt; {high:.1} for {days} consecutive days\n\
         👀 WATCHING while above {high:.1} but not yet for {days} days\n\
         ⏳ HOLD otherwise\n\
         \n\
         Notifications are checked daily at {time} ({tz}).",
        low = indicator.low_threshold,
        high = indicator.high_threshold,
        days = indicator.sustain_window,
        time = notifier.time,
        tz = notifier.timezone,
    )
}

/// Состояние уведомлений получателя, добавляется к ответу на /status
pub fn subscription_line(subscription: Option<&Subscription>, tz: Tz) -> String {
    match subscription {
        Some(sub) if sub.enabled => match sub.last_notified {
            Some(at) => format!(
                "🔔 Notifications: on (last alert {})",
                at.with_timezone(&tz).format("%Y-%m-%d %H:%M")
            ),
            None => "🔔 Notifications: on".to_string(),
        },
        _ => "🔕 Notifications: off, send /notify to turn them on".to_string(),
    }
}

pub fn notify_toggled_message(enabled: bool) -> &'static str {
    if enabled {
        "🔔 Notifications enabled. You will receive BUY and SELL signals."
    } else {
        "🔕 Notifications disabled. Send /notify to turn them back on."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::models::reading::Reading;
    use crate::services::indicators::classifier::{Classification, Signal};
    use crate::test_support;
    use crate::transport::strip_html;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(97123.456), "$97,123.46");
        assert_eq!(format_usd(1_234_567.0), "$1,234,567.00");
        assert_eq!(format_usd(999.999), "$1,000.00");
        assert_eq!(format_usd(12.5), "$12.50");
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(-1500.0), "-$1,500.00");
    }

    #[test]
    fn test_status_message_layout() {
        let settings = test_support::settings_with_db_path(":memory:");
        let evaluation = Evaluation {
            reading: Reading::new(
                Utc.with_ymd_and_hms(2025, 1, 15, 5, 0, 0).unwrap(),
                97_000.0,
                80_000.0,
            ),
            classification: Classification {
                message: "⏳ HOLD: Mayer Multiple is 1.21".to_string(),
                signal: Signal::Hold,
            },
        };

        let text = status_message(&evaluation, &settings, chrono_tz::Europe::Stockholm);
        assert!(text.starts_with("<b>Mayer Multiple Update</b>\n"));
        assert!(text.contains("Time: 2025-01-15 06:00:00"));
        assert!(text.contains("💰 Current BTC Price: $97,000.00"));
        assert!(text.contains("📊 200-day MA: $80,000.00"));
        assert!(text.contains("📈 Mayer Multiple: 1.21"));
        assert!(text.ends_with("⏳ HOLD: Mayer Multiple is 1.21"));

        let alert = alert_message(&evaluation, &settings, chrono_tz::Europe::Stockholm);
        assert!(alert.contains("Alert: HOLD"));
    }

    #[test]
    fn test_help_message_escapes_comparisons() {
        let settings = test_support::settings_with_db_path(":memory:");
        let help = help_message(&settings);
        assert!(help.contains("&lt; 1.0"));
        assert!(help.contains("&gt; 2.4 for 7 consecutive days"));
        assert!(help.contains("06:00:00 (Europe/Stockholm)"));

        let plain = strip_html(&help);
        assert!(plain.contains("BUY when Mayer Multiple < 1.0"));
        assert!(!plain.contains("<b>"));
    }

    #[test]
    fn test_subscription_line() {
        use crate::db::sqlite::models::subscription::RecipientId;

        let tz = chrono_tz::Europe::Stockholm;
        assert!(subscription_line(None, tz).contains("off"));

        let mut sub = Subscription {
            recipient: RecipientId(1),
            enabled: true,
            last_notified: None,
        };
        assert_eq!(subscription_line(Some(&sub), tz), "🔔 Notifications: on");

        sub.last_notified = Some(Utc.with_ymd_and_hms(2025, 6, 1, 4, 0, 0).unwrap());
        assert!(subscription_line(Some(&sub), tz).contains("last alert 2025-06-01 06:00"));

        sub.enabled = false;
        assert!(subscription_line(Some(&sub), tz).contains("off"));
    }
}
