// Shifts are owned by the event-management side; the coordinator only ever
// reads them (capacity, ownership, time window).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShiftRow {
    pub id: String,
    pub event_id: String,
    pub starts_at: String,
    pub ends_at: String,
    pub capacity: i64, // 0 = unlimited
}

impl ShiftRow {
    /// Whether `going_count` exhausts this shift's capacity.
    pub fn is_full(&self, going_count: i64) -> bool {
        self.capacity != 0 && going_count >= self.capacity
    }
}
