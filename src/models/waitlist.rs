// FIFO queue rows; `joined_at` fixes promotion order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WaitlistEntryRow {
    pub shift_id: String,
    pub user_id: String,
    pub joined_at: String,
}
