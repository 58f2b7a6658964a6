use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::database::{shift_repo, signup_repo, waitlist_repo};
use crate::error::CoordinatorError;
use crate::services::{attendance_service, capacity_service};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::AppState;

#[derive(Serialize)]
pub struct ShiftView {
    pub shift_id: String,
    pub event_id: String,
    pub starts_at: String,
    pub ends_at: String,
    pub capacity: i64,
    pub going_count: i64,
    pub full: bool,
}

pub async fn shift_detail_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Path(shift_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ShiftView>, CoordinatorError> {
    let Some(shift) = shift_repo::load_shift(&state.pool, &shift_id).await? else {
        return Err(CoordinatorError::ShiftNotFound);
    };
    let going_count = shift_repo::count_going(&state.pool, &shift_id).await?;

    Ok(Json(ShiftView {
        full: shift.is_full(going_count),
        shift_id: shift.id,
        event_id: shift.event_id,
        starts_at: shift.starts_at,
        ends_at: shift.ends_at,
        capacity: shift.capacity,
        going_count,
    }))
}

#[derive(Serialize)]
pub struct RosterEntryView {
    pub user_id: String,
    pub status: String,
    pub checked_in_at: Option<String>,
    pub checkin_method: Option<String>,
}

#[derive(Serialize)]
pub struct WaitlistEntryView {
    pub user_id: String,
    pub joined_at: String,
}

#[derive(Serialize)]
pub struct RosterView {
    pub roster: Vec<RosterEntryView>,
    pub waitlist: Vec<WaitlistEntryView>,
}

pub async fn roster_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Path(shift_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RosterView>, CoordinatorError> {
    if shift_repo::load_shift(&state.pool, &shift_id).await?.is_none() {
        return Err(CoordinatorError::ShiftNotFound);
    }

    let roster = signup_repo::list_for_shift(&state.pool, &shift_id)
        .await?
        .into_iter()
        .map(|r| RosterEntryView {
            user_id: r.user_id,
            status: r.status,
            checked_in_at: r.checked_in_at,
            checkin_method: r.checkin_method,
        })
        .collect();
    let waitlist = waitlist_repo::list_for_shift(&state.pool, &shift_id)
        .await?
        .into_iter()
        .map(|w| WaitlistEntryView {
            user_id: w.user_id,
            joined_at: w.joined_at,
        })
        .collect();

    Ok(Json(RosterView { roster, waitlist }))
}

#[derive(Serialize)]
pub struct RsvpResponse {
    pub status: &'static str,
}

pub async fn rsvp_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(shift_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RsvpResponse>, CoordinatorError> {
    let outcome =
        capacity_service::rsvp(&state.pool, &state.events, &shift_id, &auth_user.id).await?;

    let status = match outcome {
        capacity_service::RsvpOutcome::Reserved => "reserved",
        capacity_service::RsvpOutcome::Waitlisted => "waitlisted",
    };
    Ok(Json(RsvpResponse { status }))
}

#[derive(Debug, Deserialize, Default)]
pub struct CancelBody {
    /// Admins and moderators may cancel on behalf of another user.
    pub user_id: Option<String>,
}

pub async fn cancel_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(shift_id): Path<String>,
    State(state): State<AppState>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<RsvpResponse>, CoordinatorError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let subject = body.user_id.as_deref().unwrap_or(&auth_user.id);

    capacity_service::cancel(
        &state.pool,
        &state.events,
        &shift_id,
        subject,
        &auth_user.id,
        auth_user.role,
    )
    .await?;

    Ok(Json(RsvpResponse {
        status: "cancelled",
    }))
}

#[derive(Debug, Deserialize)]
pub struct AttendanceBody {
    pub user_id: String,
    pub attended: bool,
}

pub async fn attendance_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(shift_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<AttendanceBody>,
) -> Result<Json<RsvpResponse>, CoordinatorError> {
    attendance_service::mark_attendance(
        &state.pool,
        &state.events,
        &shift_id,
        &body.user_id,
        body.attended,
        auth_user.role,
    )
    .await?;

    Ok(Json(RsvpResponse { status: "updated" }))
}
