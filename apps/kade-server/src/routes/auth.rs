//! `/api/auth`

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use kade_core::UserProfile;

use crate::auth::{verify_password, Claims, DUMMY_PASSWORD_HASH};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    user: UserProfile,
}

async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db
        .users()
        .find_active_by_username(&request.username)
        .await?;

    // argon2 is CPU bound; keep it off the async workers.
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let password = request.password;
    let verified = tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            verify_password(&password, DUMMY_PASSWORD_HASH);
            false
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Password check failed: {e}")))?;

    let user = match user {
        Some(user) if verified => user,
        _ => {
            warn!(username = %request.username, "Failed login attempt");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let token = state.jwt.issue(&user)?;
    info!(user_id = user.id, username = %user.username, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// Echoes the claims of a valid bearer token.
async fn me(claims: Claims) -> Json<Claims> {
    Json(claims)
}
