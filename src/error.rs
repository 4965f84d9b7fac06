use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::source::memory::CatalogError;
use crate::source::SourceError;

/// Failures of a discovery call. "No results" is not an error.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid filter spec: {0}")]
    InvalidFilterSpec(String),

    #[error("invalid origin: ({lat}, {lng})")]
    InvalidOrigin { lat: f64, lng: f64 },

    #[error("data source unavailable: {0}")]
    DataSourceUnavailable(#[from] SourceError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DiscoveryError> for AppError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::InvalidFilterSpec(_) | DiscoveryError::InvalidOrigin { .. } => {
                AppError::BadRequest(err.to_string())
            }
            DiscoveryError::DataSourceUnavailable(_) => AppError::Unavailable(err.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) | CatalogError::StoreNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            CatalogError::UnknownStore(_)
            | CatalogError::InvalidStore(_)
            | CatalogError::InvalidListing(_) => AppError::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
