pub mod dto;
pub mod handlers;
pub mod memory;
pub mod model;
pub mod repo;
mod service;
pub mod validation;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::user_routes())
        .merge(handlers::me_routes())
}
