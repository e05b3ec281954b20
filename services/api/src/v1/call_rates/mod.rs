use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};

mod basic_list;
mod create;
mod delete;
mod dispatcher;
mod list;
mod show;
mod status;
mod update;

pub use dispatcher::{OpCode, RateDetail, RateDispatcher};

use crate::envelope;
use crate::extractors::RateRequest;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:op_code", get(handler).post(handler))
}

/// Entry point for every rate operation: `/v1/call-rates/{op_code}?id=...` with an optional JSON body.
pub async fn handler(
    State(state): State<AppState>,
    Path(op_code): Path<String>,
    request: RateRequest,
) -> Response {
    envelope::respond(state.dispatcher.handle(&op_code, request).await)
}
