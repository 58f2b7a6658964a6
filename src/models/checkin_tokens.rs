// Single-use self-check-in credentials. Immutable after issuance except for
// the one-time `used_at` write on redemption.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckinTokenRow {
    pub token: String,
    pub shift_id: String,
    pub expires_at: String,
    pub used_at: Option<String>,
    pub created_by: String,
    pub created_at: String,
}
