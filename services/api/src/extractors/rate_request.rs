use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::errors::RateError;

/// Operation input: the `id` query parameter plus the JSON body.
///
/// An empty body reads as `{}`; a body that is not valid JSON is kept as
/// `null` so handlers that need it answer with a business error.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRequest {
    id: Option<String>,
    body: Value,
}

impl RateRequest {
    pub fn new(id: Option<String>, body: Value) -> Self {
        Self { id, body }
    }

    pub fn from_bytes(id: Option<String>, bytes: &[u8]) -> Self {
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(bytes).unwrap_or(Value::Null)
        };
        Self::new(id, body)
    }

    /// Positive integer id, if one was supplied.
    pub fn id(&self) -> Option<i32> {
        self.id
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .filter(|id| *id > 0)
    }

    pub fn require_id(&self) -> Result<i32, RateError> {
        self.id().ok_or(RateError::IdEmpty)
    }

    pub fn body(&self) -> Result<&Map<String, Value>, RateError> {
        self.body.as_object().ok_or(RateError::InvalidBody)
    }
}

#[async_trait]
impl<S> FromRequest<S> for RateRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let Query(mut params) =
            Query::<HashMap<String, String>>::from_request_parts(&mut parts, state)
                .await
                .map_err(IntoResponse::into_response)?;

        let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(IntoResponse::into_response)?;

        Ok(Self::from_bytes(params.remove("id"), &bytes))
    }
}
