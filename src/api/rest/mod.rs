pub mod discover;
pub mod listings;
pub mod stores;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::source::memory::MemoryCatalog;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(discover::router())
        .merge(stores::router())
        .merge(listings::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn local_catalog(state: &AppState) -> Result<&MemoryCatalog, AppError> {
    state
        .catalog
        .as_deref()
        .ok_or_else(|| AppError::Conflict("listings are managed by the remote backend".to_string()))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    source: &'static str,
    listings: usize,
    stores: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (source, listings, stores) = match &state.catalog {
        Some(catalog) => ("local", catalog.listing_count(), catalog.store_count()),
        None => ("remote", 0, 0),
    };

    Json(HealthResponse {
        status: "ok",
        source,
        listings,
        stores,
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.discovery.metrics().encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
