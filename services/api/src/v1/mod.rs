use axum::Router;

pub mod call_rates;

pub fn router() -> Router<crate::AppState> {
    Router::new()
        .nest("/call-rates", call_rates::router())
}
