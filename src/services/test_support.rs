use sqlx::SqlitePool;

use crate::database::schema;

pub(crate) async fn setup_pool() -> SqlitePool {
    schema::open_pool_in_memory()
        .await
        .expect("in-memory pool should open")
}

pub(crate) async fn seed_shift(pool: &SqlitePool, shift_id: &str, capacity: i64) {
    sqlx::query(
        r#"
        INSERT INTO shifts (id, event_id, starts_at, ends_at, capacity)
        VALUES (?1, 'event-1', '2026-09-01T09:00:00Z', '2026-09-01T13:00:00Z', ?2)
        "#,
    )
    .bind(shift_id)
    .bind(capacity)
    .execute(pool)
    .await
    .expect("seed shift");
}
