use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use tracing::{error, warn};

use crate::{state::AppState, users::model::User};

/// Caller authenticated by `Authorization: Bearer <access_token>`.
pub struct AuthUser(pub User);

/// Like [`AuthUser`] but anonymous requests pass through as `None`.
pub struct MaybeAuthUser(pub Option<User>);

fn bearer_token(parts: &Parts) -> Result<Option<&str>, (StatusCode, String)> {
    let Some(auth) = parts.headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let auth = auth
        .to_str()
        .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid Authorization header".to_string()))?;
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or((StatusCode::UNAUTHORIZED, "invalid auth scheme".to_string()))?;
    Ok(Some(token.trim()))
}

async fn resolve(state: &AppState, token: &str) -> Result<User, (StatusCode, String)> {
    match User::find_identity_by_access_token(state.users.as_ref(), token, None).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            warn!("unknown access token");
            Err((StatusCode::UNAUTHORIZED, "invalid access token".to_string()))
        }
        Err(e) => {
            error!(error = %e, "identity lookup failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "identity lookup failed".to_string()))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or((StatusCode::UNAUTHORIZED, "missing Authorization header".to_string()))?;
        Ok(AuthUser(resolve(state, token).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => Ok(MaybeAuthUser(Some(resolve(state, token).await?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}
