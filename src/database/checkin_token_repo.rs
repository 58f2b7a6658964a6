use sqlx::{SqliteConnection, SqlitePool};

use crate::models::CheckinTokenRow;

const SQL_INSERT_TOKEN: &str = r#"
INSERT INTO shift_checkin_tokens (token, shift_id, expires_at, used_at, created_by, created_at)
VALUES (?1, ?2, ?3, NULL, ?4, ?5)
"#;

const SQL_LOAD_VALID: &str = r#"
SELECT token, shift_id, expires_at, used_at, created_by, created_at
FROM shift_checkin_tokens
WHERE token = ?1
  AND used_at IS NULL
  AND datetime(expires_at) > datetime(?2)
LIMIT 1
"#;

// First-writer-wins: the condition makes concurrent redemptions of the same
// token succeed for exactly one caller.
const SQL_MARK_USED: &str = r#"
UPDATE shift_checkin_tokens
SET used_at = ?2
WHERE token = ?1
  AND used_at IS NULL
  AND datetime(expires_at) > datetime(?2)
"#;

const SQL_LOAD_TOKEN: &str = r#"
SELECT token, shift_id, expires_at, used_at, created_by, created_at
FROM shift_checkin_tokens
WHERE token = ?1
LIMIT 1
"#;

pub struct NewCheckinToken<'a> {
    pub token: &'a str,
    pub shift_id: &'a str,
    pub expires_at: &'a str,
    pub created_by: &'a str,
    pub created_at: &'a str,
}

pub async fn insert_token(pool: &SqlitePool, token: NewCheckinToken<'_>) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_TOKEN)
        .bind(token.token)
        .bind(token.shift_id)
        .bind(token.expires_at)
        .bind(token.created_by)
        .bind(token.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Load a token only if it is live: unused and not yet expired at `now`.
pub async fn load_valid(
    pool: &SqlitePool,
    token: &str,
    now: &str,
) -> sqlx::Result<Option<CheckinTokenRow>> {
    sqlx::query_as::<_, CheckinTokenRow>(SQL_LOAD_VALID)
        .bind(token)
        .bind(now)
        .fetch_optional(pool)
        .await
}

/// Conditionally burn the token. Returns true for the single caller whose
/// write landed; false when the token was unknown, expired or already used.
pub async fn mark_used(conn: &mut SqliteConnection, token: &str, now: &str) -> sqlx::Result<bool> {
    let res = sqlx::query(SQL_MARK_USED)
        .bind(token)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn load_token(
    conn: &mut SqliteConnection,
    token: &str,
) -> sqlx::Result<Option<CheckinTokenRow>> {
    sqlx::query_as::<_, CheckinTokenRow>(SQL_LOAD_TOKEN)
        .bind(token)
        .fetch_optional(conn)
        .await
}
