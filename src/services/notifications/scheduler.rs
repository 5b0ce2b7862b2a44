// File: src/services/notifications/scheduler.rs
use crate::app_state::models::AppState;
use crate::services::events::Event;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Раз в сутки отправляет `Event::Tick` в заданное местное время
pub struct DailyScheduler {
    app_state: Arc<AppState>,
}

impl DailyScheduler {
    pub fn new(app_state: Arc<AppState>) -> Self {
        Self { app_state }
    }

    /// Запускает таймер. Возвращает `None`, если уведомления выключены или настроены неверно
    pub fn start(&self, events: mpsc::Sender<Event>) -> Option<JoinHandle<()>> {
        let notifier_config = &self.app_state.settings.app_config.notifier;

        if !notifier_config.enabled {
            info!("Daily notifier is disabled in configuration");
            return None;
        }

        // Время и часовой пояс проверяются один раз при старте
        let (time, tz) = match (notifier_config.daily_time(), notifier_config.tz()) {
            (Ok(time), Ok(tz)) => (time, tz),
            (Err(e), _) | (_, Err(e)) => {
                error!("Daily notifier not started: {}", e);
                return None;
            }
        };

        info!("Starting daily notifier at {} ({})", time, tz);

        Some(tokio::spawn(async move {
            let mut last_fired: Option<DateTime<Utc>> = None;

            loop {
                let now = Utc::now();
                let next = next_slot(now, last_fired, time, tz);
                let wait = (next - now).to_std().unwrap_or_default();

                debug!(
                    "Next scheduled check at {} (in {} s)",
                    next.with_timezone(&tz),
                    wait.as_secs()
                );

                // Ожидание идёт по монотонным часам, слот считается по системным
                tokio::time::sleep(wait).await;

                if events.send(Event::Tick).await.is_err() {
                    info!("Event loop closed, stopping daily notifier");
                    return;
                }

                last_fired = Some(next);
            }
        }))
    }
}

/// Следующий слот после `now`, но никогда не раньше уже сработавшего.
/// Если системные часы отвели назад, пока шло ожидание, тот же слот не повторится
pub fn next_slot(
    now: DateTime<Utc>,
    last_fired: Option<DateTime<Utc>>,
    time: NaiveTime,
    tz: Tz,
) -> DateTime<Utc> {
    let from = match last_fired {
        Some(fired) if fired > now => fired,
        _ => now,
    };
    next_run_after(from, time, tz)
}

/// Первый момент строго после `now`, когда местные часы в `tz` показывают `time`.
/// Время, пропущенное при переходе на летнее, срабатывает часом позже;
/// повторяющееся при переходе на зимнее срабатывает при первом наступлении
pub fn next_run_after(now: DateTime<Utc>, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let mut date = now.with_timezone(&tz).date_naive();

    loop {
        if let Some(candidate) = resolve_local(tz, date.and_time(time)) {
            if candidate > now {
                return candidate;
            }
        }

        date = match date.succ_opt() {
            Some(next) => next,
            None => return now,
        };
    }
}

fn resolve_local(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        // Несуществующее местное время сдвигается на час вперёд
        .or_else(|| {
            tz.from_local_datetime(&(local + ChronoDuration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
}
