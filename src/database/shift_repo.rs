use sqlx::SqlitePool;

use crate::models::ShiftRow;

// The shift store is read-only from the coordinator's perspective.

const SQL_LOAD_SHIFT: &str = r#"
SELECT
  id,
  event_id,
  starts_at,
  ends_at,
  capacity
FROM shifts
WHERE id = ?1
LIMIT 1
"#;

const SQL_COUNT_GOING: &str = r#"
SELECT COUNT(*)
FROM shift_signups
WHERE shift_id = ?1
  AND status = 'going'
"#;

pub async fn load_shift(pool: &SqlitePool, shift_id: &str) -> sqlx::Result<Option<ShiftRow>> {
    sqlx::query_as::<_, ShiftRow>(SQL_LOAD_SHIFT)
        .bind(shift_id)
        .fetch_optional(pool)
        .await
}

pub async fn count_going(pool: &SqlitePool, shift_id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_GOING)
        .bind(shift_id)
        .fetch_one(pool)
        .await
}
