//! Uniform `{code, msg}` response envelope shared by every operation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::{DispatchError, DispatchResult, RateError};

pub const SUCCESS_CODE: &str = "2901";
pub const ERROR_CODE: &str = "2904";
pub const SERVER_ERROR: &str = "serverError";

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub code: &'static str,
    pub msg: Value,
}

impl Envelope {
    pub fn success(msg: Value) -> Self {
        Self {
            code: SUCCESS_CODE,
            msg,
        }
    }

    pub fn business(err: &RateError) -> Self {
        Self {
            code: ERROR_CODE,
            msg: json!({ "error": err.payload() }),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Wrap a handler payload as `{data: ...}`.
pub fn data(value: impl Serialize) -> Value {
    json!({ "data": value })
}

pub fn respond(result: DispatchResult) -> Response {
    match result {
        Ok(msg) => Envelope::success(msg).into_response(),
        Err(DispatchError::Business(err)) => {
            tracing::debug!(error = %err, "business rule rejected request");
            Envelope::business(&err).into_response()
        }
        Err(DispatchError::Internal(err)) => err.into_response(),
    }
}
