pub mod middleware;
pub mod routes;

use sqlx::SqlitePool;

use crate::events::EventBus;

#[derive(Clone)]
pub struct AppConfig {
    /// Public base URL embedded in shareable check-in links.
    pub checkin_base_url: String,
    /// Fixed validity window for issued check-in tokens.
    pub checkin_token_ttl_hours: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub events: EventBus,
    pub config: AppConfig,
}
