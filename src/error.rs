use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

/// One failing input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub param: &'static str,
    pub msg: &'static str,
}

/// Client-facing error for every flow in the service.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("User not authorized!")]
    Forbidden,

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    /// Identifier could not be parsed; reported to clients like a missing resource.
    #[error("{0}")]
    MalformedId(&'static str),

    /// Unknown email and wrong password share this variant and message.
    #[error("Invalid Credentials!")]
    InvalidCredentials,

    #[error("Post already liked!")]
    AlreadyLiked,

    #[error("Post has not been liked!")]
    NotLiked,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidCredentials
            | AppError::AlreadyLiked
            | AppError::NotLiked => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) | AppError::MalformedId(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            AppError::Internal(e) => tracing::error!(error = %e, "internal error"),
            AppError::MalformedId(what) => tracing::debug!(%what, "malformed identifier"),
            AppError::InvalidCredentials => tracing::warn!("invalid login attempt"),
            AppError::Forbidden => tracing::warn!("ownership check failed"),
            _ => tracing::debug!(error = %self, "request rejected"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        let body = match &self {
            AppError::Validation(errors) => json!({ "errors": errors }),
            AppError::Conflict(_) | AppError::InvalidCredentials => {
                json!({ "errors": [{ "msg": self.to_string() }] })
            }
            AppError::Internal(_) => json!({ "msg": "Server error!" }),
            other => json!({ "msg": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "request body rejected");
        let msg = match rejection {
            JsonRejection::MissingJsonContentType(_) => "Content-Type must be application/json!",
            JsonRejection::JsonDataError(_) => "Request body has a field of the wrong type!",
            _ => "Request body is not valid JSON!",
        };
        AppError::Validation(vec![FieldError { param: "body", msg }])
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MalformedId { not_found, .. } => AppError::MalformedId(not_found),
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Duplicate => AppError::Conflict("User already exists!"),
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}
