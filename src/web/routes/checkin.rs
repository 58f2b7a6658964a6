use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::error::CoordinatorError;
use crate::services::checkin_service;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::AppState;

#[derive(Serialize)]
pub struct IssuedTokenResponse {
    pub token: String,
    pub url: String,
    pub expires_at: String,
}

pub async fn issue_token_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(shift_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<IssuedTokenResponse>, CoordinatorError> {
    let issued = checkin_service::issue_token(
        &state.pool,
        &shift_id,
        &auth_user.id,
        auth_user.role,
        state.config.checkin_token_ttl_hours,
        &state.config.checkin_base_url,
    )
    .await?;

    Ok(Json(IssuedTokenResponse {
        token: issued.token,
        url: issued.url,
        expires_at: issued.expires_at,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub token: String,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_id: Option<String>,
}

/// Public probe so the check-in page can show eligibility before the user
/// confirms identity. Invalid never says why.
pub async fn validate_handler(
    Query(query): Query<ValidateQuery>,
    State(state): State<AppState>,
) -> Result<Json<ValidateResponse>, CoordinatorError> {
    let shift_id = checkin_service::validate(&state.pool, &query.token).await?;
    Ok(Json(ValidateResponse {
        valid: shift_id.is_some(),
        shift_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RedeemBody {
    pub token: String,
}

#[derive(Serialize)]
pub struct RedeemResponse {
    pub status: &'static str,
    pub shift_id: String,
}

pub async fn redeem_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Json(body): Json<RedeemBody>,
) -> Result<Json<RedeemResponse>, CoordinatorError> {
    let shift_id =
        checkin_service::redeem(&state.pool, &state.events, &body.token, &auth_user.id).await?;

    Ok(Json(RedeemResponse {
        status: "checked_in",
        shift_id,
    }))
}
