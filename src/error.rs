use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::users::validation::ValidationErrors;

/// Errors raised by the user model and its persistence gateway.
#[derive(Debug, Error)]
pub enum UserError {
    /// One or more field rules failed; nothing was written.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("user not found")]
    NotFound,

    /// Caller may not modify another user's record.
    #[error("forbidden")]
    Forbidden,

    /// The pre-save hook vetoed the write.
    #[error("save aborted by before-save hook")]
    SaveAborted,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl From<ValidationErrors> for UserError {
    fn from(errors: ValidationErrors) -> Self {
        UserError::Validation(errors)
    }
}

impl From<sqlx::Error> for UserError {
    fn from(e: sqlx::Error) -> Self {
        UserError::Store(e.into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a ValidationErrors>,
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        match &self {
            UserError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody {
                    message: "Validation failed",
                    errors: Some(errors),
                }),
            )
                .into_response(),
            UserError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    message: "User not found",
                    errors: None,
                }),
            )
                .into_response(),
            UserError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(ErrorBody {
                    message: "You can only modify your own account",
                    errors: None,
                }),
            )
                .into_response(),
            _ => {
                error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        message: "Internal server error",
                        errors: None,
                    }),
                )
                    .into_response()
            }
        }
    }
}
