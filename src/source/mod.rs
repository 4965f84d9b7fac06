pub mod http;
pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::listing::{Coordinate, Listing, Store};

/// Unordered, possibly over-broad result of a single candidate read.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub listings: Vec<Listing>,
    pub stores: HashMap<String, Store>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("listing source unreachable: {0}")]
    Transport(String),

    #[error("listing source returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed listing data: {0}")]
    Malformed(String),
}

/// Where candidate listings come from. Results need not be filtered or sorted.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_candidates(
        &self,
        origin: &Coordinate,
        radius_km: f64,
    ) -> Result<CandidateSet, SourceError>;
}
