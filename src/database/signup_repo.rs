use sqlx::{SqliteConnection, SqlitePool};

use crate::models::SignupRow;

// The capacity guard lives inside this one statement: the insert only fires
// while a seat is free (or capacity is 0, or the user already holds a seat),
// and a single statement is atomic, so concurrent RSVPs cannot race past the
// bound. Zero rows affected means the shift is full.
const SQL_RESERVE_SEAT: &str = r#"
INSERT INTO shift_signups (shift_id, user_id, status, checked_in_at, checkin_method, created_at, updated_at)
SELECT ?1, ?2, 'going', NULL, NULL, ?3, ?3
WHERE (SELECT capacity FROM shifts WHERE id = ?1) = 0
   OR (SELECT COUNT(*) FROM shift_signups WHERE shift_id = ?1 AND status = 'going')
      < (SELECT capacity FROM shifts WHERE id = ?1)
   OR EXISTS (SELECT 1 FROM shift_signups WHERE shift_id = ?1 AND user_id = ?2 AND status = 'going')
ON CONFLICT (shift_id, user_id) DO UPDATE SET
  status = 'going',
  checked_in_at = NULL,
  checkin_method = NULL,
  updated_at = excluded.updated_at
"#;

const SQL_CANCEL_GOING: &str = r#"
UPDATE shift_signups
SET status = 'cancelled',
    updated_at = ?3
WHERE shift_id = ?1
  AND user_id = ?2
  AND status = 'going'
"#;

const SQL_UPSERT_CANCELLED: &str = r#"
INSERT INTO shift_signups (shift_id, user_id, status, checked_in_at, checkin_method, created_at, updated_at)
VALUES (?1, ?2, 'cancelled', NULL, NULL, ?3, ?3)
ON CONFLICT (shift_id, user_id) DO UPDATE SET
  status = 'cancelled',
  checked_in_at = NULL,
  checkin_method = NULL,
  updated_at = excluded.updated_at
"#;

// Promotion happens inside the cancellation transaction, after the freed
// seat has been verified; no capacity guard needed here.
const SQL_PROMOTE_GOING: &str = r#"
INSERT INTO shift_signups (shift_id, user_id, status, checked_in_at, checkin_method, created_at, updated_at)
VALUES (?1, ?2, 'going', NULL, NULL, ?3, ?3)
ON CONFLICT (shift_id, user_id) DO UPDATE SET
  status = 'going',
  checked_in_at = NULL,
  checkin_method = NULL,
  updated_at = excluded.updated_at
"#;

const SQL_MARK_ATTENDANCE: &str = r#"
UPDATE shift_signups
SET status = ?3,
    checked_in_at = ?4,
    checkin_method = ?5,
    updated_at = ?6
WHERE shift_id = ?1
  AND user_id = ?2
"#;

// Token redemption confirms presence, so it bypasses the capacity guard.
const SQL_UPSERT_ATTENDED: &str = r#"
INSERT INTO shift_signups (shift_id, user_id, status, checked_in_at, checkin_method, created_at, updated_at)
VALUES (?1, ?2, 'attended', ?3, 'token', ?3, ?3)
ON CONFLICT (shift_id, user_id) DO UPDATE SET
  status = 'attended',
  checked_in_at = excluded.checked_in_at,
  checkin_method = 'token',
  updated_at = excluded.updated_at
"#;

const SQL_LOAD_SIGNUP: &str = r#"
SELECT shift_id, user_id, status, checked_in_at, checkin_method, created_at, updated_at
FROM shift_signups
WHERE shift_id = ?1
  AND user_id = ?2
LIMIT 1
"#;

const SQL_LIST_FOR_SHIFT: &str = r#"
SELECT shift_id, user_id, status, checked_in_at, checkin_method, created_at, updated_at
FROM shift_signups
WHERE shift_id = ?1
ORDER BY created_at, rowid
"#;

const SQL_COUNT_GOING: &str = r#"
SELECT COUNT(*)
FROM shift_signups
WHERE shift_id = ?1
  AND status = 'going'
"#;

const SQL_IS_GOING: &str = r#"
SELECT COUNT(*)
FROM shift_signups
WHERE shift_id = ?1
  AND user_id = ?2
  AND status = 'going'
"#;

/// Try to reserve a seat. Returns true when the caller holds a `going`
/// signup afterwards; false when the shift was full.
pub async fn reserve_seat(
    conn: &mut SqliteConnection,
    shift_id: &str,
    user_id: &str,
    now: &str,
) -> sqlx::Result<bool> {
    let res = sqlx::query(SQL_RESERVE_SEAT)
        .bind(shift_id)
        .bind(user_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Flip a `going` signup to `cancelled`. Returns true when a seat was
/// actually freed by this call.
pub async fn cancel_going(
    conn: &mut SqliteConnection,
    shift_id: &str,
    user_id: &str,
    now: &str,
) -> sqlx::Result<bool> {
    let res = sqlx::query(SQL_CANCEL_GOING)
        .bind(shift_id)
        .bind(user_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Record cancellation intent even when no `going` signup existed.
pub async fn upsert_cancelled(
    conn: &mut SqliteConnection,
    shift_id: &str,
    user_id: &str,
    now: &str,
) -> sqlx::Result<()> {
    sqlx::query(SQL_UPSERT_CANCELLED)
        .bind(shift_id)
        .bind(user_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn promote_going(
    conn: &mut SqliteConnection,
    shift_id: &str,
    user_id: &str,
    now: &str,
) -> sqlx::Result<()> {
    sqlx::query(SQL_PROMOTE_GOING)
        .bind(shift_id)
        .bind(user_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}

/// Set attendance on an existing signup. A missing row is a no-op, matching
/// the admin roster flow where only listed signups get marked.
pub async fn mark_attendance(
    pool: &SqlitePool,
    shift_id: &str,
    user_id: &str,
    status: &str,
    checked_in_at: Option<&str>,
    checkin_method: Option<&str>,
    now: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_MARK_ATTENDANCE)
        .bind(shift_id)
        .bind(user_id)
        .bind(status)
        .bind(checked_in_at)
        .bind(checkin_method)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn upsert_attended_via_token(
    conn: &mut SqliteConnection,
    shift_id: &str,
    user_id: &str,
    now: &str,
) -> sqlx::Result<()> {
    sqlx::query(SQL_UPSERT_ATTENDED)
        .bind(shift_id)
        .bind(user_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn load_signup(
    pool: &SqlitePool,
    shift_id: &str,
    user_id: &str,
) -> sqlx::Result<Option<SignupRow>> {
    sqlx::query_as::<_, SignupRow>(SQL_LOAD_SIGNUP)
        .bind(shift_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_shift(pool: &SqlitePool, shift_id: &str) -> sqlx::Result<Vec<SignupRow>> {
    sqlx::query_as::<_, SignupRow>(SQL_LIST_FOR_SHIFT)
        .bind(shift_id)
        .fetch_all(pool)
        .await
}

pub async fn count_going_tx(conn: &mut SqliteConnection, shift_id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_GOING)
        .bind(shift_id)
        .fetch_one(conn)
        .await
}

pub async fn is_going_tx(
    conn: &mut SqliteConnection,
    shift_id: &str,
    user_id: &str,
) -> sqlx::Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(SQL_IS_GOING)
        .bind(shift_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}
