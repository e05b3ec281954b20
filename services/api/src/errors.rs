use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::fmt;

use crate::envelope::{ERROR_CODE, SERVER_ERROR};
use crate::ports::StoreError;
use crate::validation::FieldErrors;

/// Unexpected failure. Rendered as an opaque 500; the message only reaches the logs.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(status = %self.status, message = %self.message, "request failed");

        let body = Json(json!({
            "code": ERROR_CODE,
            "msg": {
                "error": SERVER_ERROR,
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::internal_server_error(format!("Storage error: {}", err))
    }
}

impl From<postgres_models::DbError> for AppError {
    fn from(err: postgres_models::DbError) -> Self {
        AppError::internal_server_error(format!("Database error: {}", err))
    }
}

/// Expected, user-facing failure. Answered with HTTP 200 and the error code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateError {
    #[error("id is empty")]
    IdEmpty,

    #[error("notFoundError")]
    NotFound,

    #[error("form validation failed")]
    Validation(FieldErrors),

    #[error("Name already exists")]
    NameTaken,

    #[error(".conf connection error")]
    ConfUnavailable,

    #[error("rates .conf error")]
    ConfRejected,

    #[error("Status not updated!")]
    StatusNotUpdated,

    #[error("order must be asc or desc")]
    InvalidOrder,

    #[error("Invalid orderField")]
    InvalidOrderField,

    #[error("page and perpage must be positive integers")]
    InvalidPagination,

    #[error("invalid request body")]
    InvalidBody,
}

impl RateError {
    /// Value placed under `msg.error`: the field map for validation, the message otherwise.
    pub fn payload(&self) -> Value {
        match self {
            Self::Validation(errors) => json!(errors),
            other => Value::String(other.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Business(#[from] RateError),

    #[error(transparent)]
    Internal(#[from] AppError),
}

impl From<StoreError> for DispatchError {
    fn from(err: StoreError) -> Self {
        DispatchError::Internal(err.into())
    }
}

/// `Ok` carries the `msg` object of a success envelope.
pub type DispatchResult = Result<Value, DispatchError>;
