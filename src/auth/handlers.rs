use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{dto::LoginRequest, identity::Identity},
    state::AppState,
    users::model::{User, UserResponse},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Exchanges email and password for the caller's own projection, which
/// carries the `access_token` to send as a bearer credential.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    let email = payload.email.trim();

    let user = match User::authenticate(state.users.as_ref(), email, &payload.password).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!("login rejected");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => {
            error!(error = %e, "authenticate failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into()));
        }
    };

    let body = match user
        .to_response(state.users.as_ref(), Some(&user as &dyn Identity))
        .await
    {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, user_id = %user.id, "load answers failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into()));
        }
    };

    info!(user_id = %user.id, "user logged in");
    Ok(Json(body))
}
