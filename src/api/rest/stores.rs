use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::local_catalog;
use crate::error::AppError;
use crate::models::listing::{Coordinate, Listing, NearbyStore, Store, StoreUpdate};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stores", post(register_store))
        .route("/stores/nearby", get(nearby_stores))
        .route("/stores/:id", get(get_store).put(update_store))
        .route("/stores/:id/listings", get(list_store_listings))
}

#[derive(Deserialize)]
pub struct RegisterStoreRequest {
    pub name: String,
    pub location: Coordinate,
    pub address: Option<String>,
}

async fn register_store(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterStoreRequest>,
) -> Result<Json<Store>, AppError> {
    let catalog = local_catalog(&state)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if !payload.location.is_valid() {
        return Err(AppError::BadRequest(format!(
            "location out of range: ({}, {})",
            payload.location.lat, payload.location.lng
        )));
    }

    let store = catalog.register_store(Store {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        location: payload.location,
        address: payload.address,
    });

    Ok(Json(store))
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: Option<f64>,
}

async fn nearby_stores(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyStore>>, AppError> {
    let catalog = local_catalog(&state)?;

    let origin = Coordinate::new(query.lat, query.lng);
    if !origin.is_valid() {
        return Err(AppError::BadRequest(format!(
            "origin out of range: ({}, {})",
            query.lat, query.lng
        )));
    }

    let radius_km = query.radius_km.unwrap_or(state.defaults.max_distance_km);
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(AppError::BadRequest(format!(
            "radius_km must be positive, got {radius_km}"
        )));
    }

    Ok(Json(catalog.stores_near(&origin, radius_km)))
}

async fn update_store(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<StoreUpdate>,
) -> Result<Json<Store>, AppError> {
    let catalog = local_catalog(&state)?;
    Ok(Json(catalog.update_store(&id, payload)?))
}

async fn get_store(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Store>, AppError> {
    let catalog = local_catalog(&state)?;

    catalog
        .store(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("store {id} not found")))
}

async fn list_store_listings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Listing>>, AppError> {
    let catalog = local_catalog(&state)?;

    if catalog.store(&id).is_none() {
        return Err(AppError::NotFound(format!("store {id} not found")));
    }

    Ok(Json(catalog.listings_for_store(&id)))
}
