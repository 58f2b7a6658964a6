use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

// Shifts are seeded by the event-management side; the coordinator owns the
// three tables below it. Deleting a shift cascades into all of them.
const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS shifts (
  id TEXT PRIMARY KEY,
  event_id TEXT NOT NULL,
  starts_at TEXT NOT NULL,
  ends_at TEXT NOT NULL,
  capacity INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS shift_signups (
  shift_id TEXT NOT NULL REFERENCES shifts(id) ON DELETE CASCADE,
  user_id TEXT NOT NULL,
  status TEXT NOT NULL,
  checked_in_at TEXT,
  checkin_method TEXT,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL,
  PRIMARY KEY (shift_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_shift_signups_shift_status
  ON shift_signups (shift_id, status);

CREATE TABLE IF NOT EXISTS shift_waitlist (
  shift_id TEXT NOT NULL REFERENCES shifts(id) ON DELETE CASCADE,
  user_id TEXT NOT NULL,
  joined_at TEXT NOT NULL,
  PRIMARY KEY (shift_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_shift_waitlist_joined
  ON shift_waitlist (shift_id, joined_at);

CREATE TABLE IF NOT EXISTS shift_checkin_tokens (
  token TEXT PRIMARY KEY,
  shift_id TEXT NOT NULL REFERENCES shifts(id) ON DELETE CASCADE,
  expires_at TEXT NOT NULL,
  used_at TEXT,
  created_by TEXT NOT NULL,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
  user_id TEXT PRIMARY KEY,
  role TEXT NOT NULL DEFAULT 'user'
);
"#;

/// Apply the coordinator schema. Idempotent; run once at startup.
pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::raw_sql(DDL).execute(pool).await?;
    Ok(())
}

/// Open a connection pool for the given database URL with foreign keys
/// enabled and a busy timeout, and apply the schema.
pub async fn open_pool(database_url: &str) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Open an in-memory pool with the schema applied (for testing).
pub async fn open_pool_in_memory() -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    ensure_schema(&pool).await?;
    Ok(pool)
}
