use sqlx::SqlitePool;

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Readings: append-only, keyed by UTC milliseconds
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS readings (
  recorded_at_ms INTEGER PRIMARY KEY,
  indicator REAL NOT NULL CHECK (indicator > 0),
  price REAL NOT NULL CHECK (price > 0),
  moving_average REAL NOT NULL CHECK (moving_average > 0)
);
"#,
    )
    .execute(pool)
    .await?;

    // Subscriptions
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS subscriptions (
  chat_id INTEGER PRIMARY KEY,
  enabled INTEGER NOT NULL CHECK (enabled IN (0,1)),
  last_notified_ms INTEGER
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_subscriptions_enabled ON subscriptions(enabled);"#)
        .execute(pool)
        .await?;

    Ok(())
}
