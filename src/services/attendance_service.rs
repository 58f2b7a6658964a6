use sqlx::SqlitePool;

use crate::database::signup_repo;
use crate::error::CoordinatorError;
use crate::events::{DomainEvent, EventBus};
use crate::models::{CheckinMethod, Role, SignupStatus};

use super::now_rfc3339;

/// Mark a signup `attended` or `no_show`.
///
/// Admin/moderator only. Re-marking is allowed regardless of prior status,
/// and marking never touches capacity accounting: only `going` rows count
/// against the bound, and promotion runs solely on cancellation.
pub async fn mark_attendance(
    pool: &SqlitePool,
    events: &EventBus,
    shift_id: &str,
    user_id: &str,
    attended: bool,
    actor_role: Role,
) -> Result<(), CoordinatorError> {
    if !actor_role.can_manage_attendance() {
        return Err(CoordinatorError::Forbidden);
    }

    let now = now_rfc3339();
    let (status, checked_in_at, method) = if attended {
        (
            SignupStatus::Attended,
            Some(now.as_str()),
            Some(CheckinMethod::Manual.as_str()),
        )
    } else {
        (SignupStatus::NoShow, None, None)
    };

    let updated = signup_repo::mark_attendance(
        pool,
        shift_id,
        user_id,
        status.as_str(),
        checked_in_at,
        method,
        &now,
    )
    .await?;

    if updated > 0 {
        events.publish(DomainEvent::SignupChanged {
            shift_id: shift_id.to_string(),
            user_id: user_id.to_string(),
            status,
        });
    }

    Ok(())
}
