use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::local_catalog;
use crate::error::AppError;
use crate::models::listing::{Category, Listing, ListingUpdate};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/listings", post(post_listing))
        .route(
            "/listings/:id",
            get(get_listing).put(update_listing).delete(remove_listing),
        )
        .route("/listings/:id/quantity", patch(update_quantity))
}

#[derive(Deserialize)]
pub struct PostListingRequest {
    pub store_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: u32,
    pub original_price: u32,
    pub quantity: u32,
    pub expiry_at: DateTime<Utc>,
    pub category: Category,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

async fn post_listing(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PostListingRequest>,
) -> Result<Json<Listing>, AppError> {
    let catalog = local_catalog(&state)?;

    let store = catalog.store(&payload.store_id).ok_or_else(|| {
        AppError::BadRequest(format!("store {} is not registered", payload.store_id))
    })?;

    let listing = Listing {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        description: payload.description,
        price: payload.price,
        original_price: payload.original_price,
        available_quantity: payload.quantity,
        expiry_at: payload.expiry_at,
        category: payload.category,
        tags: payload.tags,
        store_id: store.id,
        location: store.location,
        image_url: payload.image_url,
        created_at: Utc::now(),
    };

    Ok(Json(catalog.post_listing(listing)?))
}

async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Listing>, AppError> {
    let catalog = local_catalog(&state)?;

    catalog
        .listing(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("listing {id} not found")))
}

async fn update_quantity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<Json<Listing>, AppError> {
    let catalog = local_catalog(&state)?;
    Ok(Json(catalog.update_quantity(&id, payload.quantity)?))
}

async fn update_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ListingUpdate>,
) -> Result<Json<Listing>, AppError> {
    let catalog = local_catalog(&state)?;
    Ok(Json(catalog.update_listing(&id, payload)?))
}

async fn remove_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Listing>, AppError> {
    let catalog = local_catalog(&state)?;
    Ok(Json(catalog.remove_listing(&id)?))
}
