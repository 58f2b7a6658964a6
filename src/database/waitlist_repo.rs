use sqlx::{SqliteConnection, SqlitePool};

use crate::models::WaitlistEntryRow;

// Re-joining an existing waitlist entry keeps the original joined_at, so a
// retried RSVP never loses the caller's queue position.
const SQL_JOIN_WAITLIST: &str = r#"
INSERT INTO shift_waitlist (shift_id, user_id, joined_at)
VALUES (?1, ?2, ?3)
ON CONFLICT (shift_id, user_id) DO NOTHING
"#;

// rowid breaks ties between entries joined in the same instant, preserving
// insertion order.
const SQL_PEEK_HEAD: &str = r#"
SELECT shift_id, user_id, joined_at
FROM shift_waitlist
WHERE shift_id = ?1
ORDER BY joined_at, rowid
LIMIT 1
"#;

const SQL_REMOVE_ENTRY: &str = r#"
DELETE FROM shift_waitlist
WHERE shift_id = ?1
  AND user_id = ?2
"#;

const SQL_LIST_FOR_SHIFT: &str = r#"
SELECT shift_id, user_id, joined_at
FROM shift_waitlist
WHERE shift_id = ?1
ORDER BY joined_at, rowid
"#;

pub async fn join_waitlist(
    conn: &mut SqliteConnection,
    shift_id: &str,
    user_id: &str,
    joined_at: &str,
) -> sqlx::Result<()> {
    sqlx::query(SQL_JOIN_WAITLIST)
        .bind(shift_id)
        .bind(user_id)
        .bind(joined_at)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn peek_head(
    conn: &mut SqliteConnection,
    shift_id: &str,
) -> sqlx::Result<Option<WaitlistEntryRow>> {
    sqlx::query_as::<_, WaitlistEntryRow>(SQL_PEEK_HEAD)
        .bind(shift_id)
        .fetch_optional(conn)
        .await
}

pub async fn remove_entry(
    conn: &mut SqliteConnection,
    shift_id: &str,
    user_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_REMOVE_ENTRY)
        .bind(shift_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_for_shift(
    pool: &SqlitePool,
    shift_id: &str,
) -> sqlx::Result<Vec<WaitlistEntryRow>> {
    sqlx::query_as::<_, WaitlistEntryRow>(SQL_LIST_FOR_SHIFT)
        .bind(shift_id)
        .fetch_all(pool)
        .await
}
