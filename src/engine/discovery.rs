use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::engine::{filter, ranking};
use crate::error::DiscoveryError;
use crate::models::filter::FilterSpec;
use crate::models::listing::{Coordinate, Listing};
use crate::models::ranked::RankedListing;
use crate::observability::metrics::Metrics;
use crate::source::{CandidateSet, ListingSource};

/// Exact (origin, radius) bit patterns. Nearby-but-different origins miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    lat: u64,
    lng: u64,
    radius: u64,
}

impl CacheKey {
    fn new(origin: &Coordinate, radius_km: f64) -> Self {
        Self {
            lat: origin.lat.to_bits(),
            lng: origin.lng.to_bits(),
            radius: radius_km.to_bits(),
        }
    }
}

struct CachedCandidates {
    fetched_at: Instant,
    candidates: Arc<CandidateSet>,
}

/// Cloning is cheap; clones share the source, the candidate cache and metrics.
#[derive(Clone)]
pub struct DiscoveryService {
    source: Arc<dyn ListingSource>,
    cache_ttl: Duration,
    cache: Arc<DashMap<CacheKey, CachedCandidates>>,
    metrics: Metrics,
}

impl DiscoveryService {
    pub fn new(source: Arc<dyn ListingSource>) -> Self {
        Self {
            source,
            cache_ttl: Duration::ZERO,
            cache: Arc::new(DashMap::new()),
            metrics: Metrics::new(),
        }
    }

    /// Memoize successful candidate reads for `ttl`. Zero disables memoization.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn discover(
        &self,
        origin: Coordinate,
        spec: &FilterSpec,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedListing>, DiscoveryError> {
        let start = Instant::now();
        let result = self.run(origin, spec, now).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(ranked) => {
                self.metrics.observe_outcome("success", elapsed);
                self.metrics.discovery_results.observe(ranked.len() as f64);
            }
            Err(DiscoveryError::DataSourceUnavailable(_)) => {
                self.metrics.observe_outcome("unavailable", elapsed);
            }
            Err(_) => {
                self.metrics.observe_outcome("invalid", elapsed);
            }
        }

        result
    }

    async fn run(
        &self,
        origin: Coordinate,
        spec: &FilterSpec,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedListing>, DiscoveryError> {
        if !origin.is_valid() {
            return Err(DiscoveryError::InvalidOrigin {
                lat: origin.lat,
                lng: origin.lng,
            });
        }
        spec.validate().map_err(DiscoveryError::InvalidFilterSpec)?;

        let candidates = self.candidates(&origin, spec.max_distance_km).await?;
        let candidate_count = candidates.listings.len();

        let unique = dedup_by_id(&candidates.listings);
        let matching = filter::apply(unique, &candidates.stores, &origin, spec, now);
        let ranked = ranking::rank(matching, &origin, spec.sort_by, now);

        debug!(
            origin_lat = origin.lat,
            origin_lng = origin.lng,
            radius_km = spec.max_distance_km,
            sort_by = %spec.sort_by,
            candidates = candidate_count,
            results = ranked.len(),
            "discovery completed"
        );

        Ok(ranked)
    }

    async fn candidates(
        &self,
        origin: &Coordinate,
        radius_km: f64,
    ) -> Result<Arc<CandidateSet>, DiscoveryError> {
        let key = CacheKey::new(origin, radius_km);

        if !self.cache_ttl.is_zero() {
            if let Some(entry) = self.cache.get(&key) {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    self.metrics.candidate_cache_hits_total.inc();
                    return Ok(entry.candidates.clone());
                }
            }
        }

        let fetched = match self.source.fetch_candidates(origin, radius_km).await {
            Ok(set) => Arc::new(set),
            Err(err) => {
                warn!(
                    origin_lat = origin.lat,
                    origin_lng = origin.lng,
                    radius_km,
                    error = %err,
                    "listing source failed"
                );
                return Err(err.into());
            }
        };

        if !self.cache_ttl.is_zero() {
            let ttl = self.cache_ttl;
            self.cache.retain(|_, cached| cached.fetched_at.elapsed() < ttl);
            self.cache.insert(
                key,
                CachedCandidates {
                    fetched_at: Instant::now(),
                    candidates: fetched.clone(),
                },
            );
        }

        Ok(fetched)
    }
}

fn dedup_by_id(listings: &[Listing]) -> Vec<Listing> {
    let mut seen = HashSet::with_capacity(listings.len());
    listings
        .iter()
        .filter(|listing| seen.insert(listing.id.as_str()))
        .cloned()
        .collect()
}
