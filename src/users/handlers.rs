use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    answers::Answer,
    auth::{
        extractors::{AuthUser, MaybeAuthUser},
        identity::Identity,
    },
    error::UserError,
    state::AppState,
};

use super::dto::{CreateUser, UpdateUser};
use super::model::{User, UserResponse};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", get(view_user).put(update_user))
        .route("/users/:id/answers", get(list_answers))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn as_identity(user: &Option<User>) -> Option<&dyn Identity> {
    user.as_ref().map(|u| u as &dyn Identity)
}

async fn load(state: &AppState, id: &str) -> Result<User, UserError> {
    User::find_identity(state.users.as_ref(), id)
        .await?
        .ok_or(UserError::NotFound)
}

#[instrument(skip(state, caller, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, HeaderMap, Json<UserResponse>), UserError> {
    let user = User::create(state.users.as_ref(), payload).await?;
    let body = user
        .to_response(state.users.as_ref(), as_identity(&caller))
        .await?;

    let mut headers = HeaderMap::new();
    let location = HeaderValue::from_str(&format!("/api/v1/users/{}", user.id))
        .map_err(|e| UserError::Store(e.into()))?;
    headers.insert(header::LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(body)))
}

#[instrument(skip(state, caller))]
pub async fn view_user(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, UserError> {
    let user = load(&state, &id).await?;
    let body = user
        .to_response(state.users.as_ref(), as_identity(&caller))
        .await?;
    Ok(Json(body))
}

#[instrument(skip(state, caller, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUser>,
) -> Result<Json<UserResponse>, UserError> {
    if caller.id != id {
        info!(caller_id = %caller.id, target_id = %id, "update of foreign user refused");
        return Err(UserError::Forbidden);
    }
    let mut user = load(&state, &id).await?;
    user.update(state.users.as_ref(), payload).await?;
    let body = user
        .to_response(state.users.as_ref(), Some(&caller as &dyn Identity))
        .await?;
    Ok(Json(body))
}

#[instrument(skip(state))]
pub async fn list_answers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Answer>>, UserError> {
    let user = load(&state, &id).await?;
    Ok(Json(user.answers(state.users.as_ref()).await?))
}

#[instrument(skip(state, caller))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<UserResponse>, UserError> {
    let body = caller
        .to_response(state.users.as_ref(), Some(&caller as &dyn Identity))
        .await?;
    Ok(Json(body))
}
