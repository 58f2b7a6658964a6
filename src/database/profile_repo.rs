use sqlx::SqlitePool;

const SQL_LOAD_ROLE: &str = r#"
SELECT role
FROM profiles
WHERE user_id = ?1
LIMIT 1
"#;

pub async fn load_role(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<String>> {
    sqlx::query_scalar::<_, String>(SQL_LOAD_ROLE)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}
