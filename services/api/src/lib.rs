use anyhow::anyhow;
use axum::{routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod config;
pub mod envelope;
pub mod errors;
pub mod extractors;
pub mod payload;
pub mod ports;
pub mod reconcile;
pub mod saga;
pub mod store;
pub mod v1;
pub mod validation;

use crate::config::{Config, StorageBackend};
use crate::store::{MemoryStore, PgStore};
use crate::v1::call_rates::RateDispatcher;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: RateDispatcher,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let conf = conf_client::create_client(&config.conf_settings())
            .map_err(|e| anyhow!("Failed to create conf client: {}", e))?;
        let conf = Arc::new(conf);

        let dispatcher = match config.storage {
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
                let db_pool = postgres_models::create_pool(database_url)
                    .await
                    .map_err(|e| anyhow!("Failed to create database pool: {}", e))?;
                let store = Arc::new(PgStore::new(db_pool));
                RateDispatcher::new(store.clone(), store, conf)
            }
            StorageBackend::Memory => {
                let store = Arc::new(MemoryStore::new());
                RateDispatcher::new(store.clone(), store, conf)
            }
        };

        Ok(Self { dispatcher })
    }

    pub fn from_dispatcher(dispatcher: RateDispatcher) -> Self {
        Self { dispatcher }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "call-rates-api"
    }))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/v1", v1::router())
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
