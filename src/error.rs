use crate::validator::FieldErrors;
use axum::{
    Json,
    http::{Method, StatusCode},
    response::IntoResponse,
};
use serde_json::{Value, json};
use sqlx::Error as SqlxError;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::error;

/// Failures surfaced by the credential store.
///
/// Everything other than `RecordNotFound` is a generic storage failure.
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("record not found")]
    RecordNotFound,

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Database operation exceeded {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("the requested resource could not be found")]
    NotFound,

    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(Method),

    #[error("failed validation")]
    FailedValidation(FieldErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::Store(StoreError::RecordNotFound) => {
                StatusCode::NOT_FOUND
            }
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::FailedValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message: Value = match self {
            ApiError::FailedValidation(errors) => json!(errors),
            ApiError::Store(StoreError::RecordNotFound) => {
                Value::String(ApiError::NotFound.to_string())
            }
            ApiError::Store(e) => {
                error!(error = %e, "request failed on storage");
                Value::String(SERVER_ERROR_MESSAGE.to_string())
            }
            other => Value::String(other.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Generic 500 body, used where no `ApiError` is available (panic recovery).
pub fn server_error_body() -> Value {
    json!({ "error": SERVER_ERROR_MESSAGE })
}
