use chrono::{Duration, SecondsFormat, Utc};
use rand::RngCore;
use sqlx::SqlitePool;
use tracing::info;

use crate::database::{checkin_token_repo, shift_repo, signup_repo};
use crate::error::CoordinatorError;
use crate::events::{DomainEvent, EventBus};
use crate::models::{Role, SignupStatus};

use super::now_rfc3339;

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub url: String,
    pub expires_at: String,
}

/// Issue a single-use check-in token for a shift (admin only).
///
/// Several live tokens may coexist for one shift; each is independently
/// valid until used or expired.
pub async fn issue_token(
    pool: &SqlitePool,
    shift_id: &str,
    actor_user_id: &str,
    actor_role: Role,
    ttl_hours: i64,
    base_url: &str,
) -> Result<IssuedToken, CoordinatorError> {
    if !actor_role.is_admin() {
        return Err(CoordinatorError::Forbidden);
    }
    if shift_repo::load_shift(pool, shift_id).await?.is_none() {
        return Err(CoordinatorError::ShiftNotFound);
    }

    let token = generate_token();
    let issued_at = Utc::now();
    let now = issued_at.to_rfc3339_opts(SecondsFormat::Millis, true);
    let expires_at =
        (issued_at + Duration::hours(ttl_hours)).to_rfc3339_opts(SecondsFormat::Millis, true);

    checkin_token_repo::insert_token(
        pool,
        checkin_token_repo::NewCheckinToken {
            token: &token,
            shift_id,
            expires_at: &expires_at,
            created_by: actor_user_id,
            created_at: &now,
        },
    )
    .await?;

    info!(shift_id, created_by = actor_user_id, "Issued check-in token");

    let url = format!(
        "{}/checkin?token={}",
        base_url.trim_end_matches('/'),
        token
    );
    Ok(IssuedToken {
        token,
        url,
        expires_at,
    })
}

/// Side-effect-free validity probe. Returns the shift id for a live token;
/// `None` for unknown, expired and used tokens alike, so the answer never
/// reveals whether a token exists.
pub async fn validate(pool: &SqlitePool, token: &str) -> Result<Option<String>, CoordinatorError> {
    let now = now_rfc3339();
    let row = checkin_token_repo::load_valid(pool, token, &now).await?;
    Ok(row.map(|r| r.shift_id))
}

/// Redeem a token: burn it and record the caller as `attended`.
///
/// Validity is re-checked at redemption time, and the `used_at` write is
/// conditional, so concurrent redemptions of one token produce exactly one
/// success. Check-in confirms presence rather than requesting a seat, so it
/// is deliberately not subject to the capacity bound.
pub async fn redeem(
    pool: &SqlitePool,
    events: &EventBus,
    token: &str,
    user_id: &str,
) -> Result<String, CoordinatorError> {
    let now = now_rfc3339();
    let mut tx = pool.begin().await?;

    if !checkin_token_repo::mark_used(&mut *tx, token, &now).await? {
        return Err(CoordinatorError::TokenInvalid);
    }
    let Some(row) = checkin_token_repo::load_token(&mut *tx, token).await? else {
        return Err(CoordinatorError::TokenInvalid);
    };
    signup_repo::upsert_attended_via_token(&mut *tx, &row.shift_id, user_id, &now).await?;

    tx.commit().await?;

    info!(shift_id = %row.shift_id, user_id, "Token check-in");
    events.publish(DomainEvent::TokenRedeemed {
        shift_id: row.shift_id.clone(),
        user_id: user_id.to_string(),
    });
    events.publish(DomainEvent::SignupChanged {
        shift_id: row.shift_id.clone(),
        user_id: user_id.to_string(),
        status: SignupStatus::Attended,
    });

    Ok(row.shift_id)
}

/// 128 bits of entropy, hex-encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
