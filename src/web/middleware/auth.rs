use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use tracing::warn;

use crate::database::profile_repo;
use crate::models::Role;
use crate::web::AppState;

/// Identity context injected into every protected request.
///
/// Token issuance and signature verification belong to the identity
/// provider; this middleware only extracts the already-authenticated
/// subject and resolves its role.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub role: Role,
}

#[derive(Deserialize)]
struct JwtPayload {
    sub: String,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Extract cookies from request
    let token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split("; ")
                .find(|c| c.starts_with("access_token="))
                .and_then(|c| c.strip_prefix("access_token="))
        });

    if let Some(token) = token {
        // Parse JWT payload (middle part)
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() == 3 {
            if let Ok(payload_bytes) = general_purpose::URL_SAFE_NO_PAD.decode(parts[1]) {
                if let Ok(payload) = serde_json::from_slice::<JwtPayload>(&payload_bytes) {
                    // Unknown users default to the least-privileged role, but
                    // a lookup failure must not demote anyone.
                    let role = match profile_repo::load_role(&state.pool, &payload.sub).await {
                        Ok(Some(r)) => Role::parse(&r),
                        Ok(None) => Role::User,
                        Err(e) => {
                            warn!("Role lookup failed for {}: {}", payload.sub, e);
                            return Response::builder()
                                .status(500)
                                .body(axum::body::Body::from("Internal error"))
                                .unwrap();
                        }
                    };

                    request.extensions_mut().insert(AuthenticatedUser {
                        id: payload.sub,
                        role,
                    });

                    return next.run(request).await;
                }
            }
        }
    }

    // No valid token or parse error, return 401
    Response::builder()
        .status(401)
        .body(axum::body::Body::from("Unauthorized - Please login"))
        .unwrap()
}
