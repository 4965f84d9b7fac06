use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::filter::{FilterSpec, SortKey};
use crate::models::listing::{Category, Coordinate};
use crate::models::ranked::RankedListing;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/discover", get(discover))
}

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    pub lat: f64,
    pub lng: f64,
    pub category: Option<String>,
    pub max_price: Option<i64>,
    pub max_distance_km: Option<f64>,
    pub q: Option<String>,
    pub sort_by: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub total: usize,
    pub offset: usize,
    pub items: Vec<RankedListing>,
}

async fn discover(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<DiscoverResponse>, AppError> {
    let sort_by = match query.sort_by.as_deref() {
        Some(raw) if !raw.trim().is_empty() => {
            raw.parse::<SortKey>().map_err(AppError::BadRequest)?
        }
        _ => SortKey::default(),
    };

    let spec = FilterSpec {
        category: query
            .category
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(Category::parse),
        max_price_inclusive: query.max_price.unwrap_or(state.defaults.max_price),
        max_distance_km: query
            .max_distance_km
            .unwrap_or(state.defaults.max_distance_km),
        text_query: query.q,
        sort_by,
    };

    let origin = Coordinate::new(query.lat, query.lng);
    let ranked = state.discovery.discover(origin, &spec, Utc::now()).await?;

    let total = ranked.len();
    let offset = query.offset.unwrap_or(0);
    let items = ranked
        .into_iter()
        .skip(offset)
        .take(query.limit.unwrap_or(usize::MAX))
        .collect();

    Ok(Json(DiscoverResponse {
        total,
        offset,
        items,
    }))
}
