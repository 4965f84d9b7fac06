use std::cmp::Reverse;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tracing::info;

use crate::geo::{bounding_box, distance_km};
use crate::models::listing::{Coordinate, Listing, ListingUpdate, NearbyStore, Store, StoreUpdate};
use crate::source::{CandidateSet, ListingSource, SourceError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("store {0} is not registered")]
    UnknownStore(String),

    #[error("store {0} not found")]
    StoreNotFound(String),

    #[error("invalid store: {0}")]
    InvalidStore(String),

    #[error("invalid listing: {0}")]
    InvalidListing(String),

    #[error("listing {0} not found")]
    NotFound(String),
}

/// Local listing catalog that stores post into. Serves candidates by a
/// bounding-box pre-selection, so it over-returns near the box corners.
#[derive(Default)]
pub struct MemoryCatalog {
    stores: DashMap<String, Store>,
    listings: DashMap<String, Listing>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_store(&self, store: Store) -> Store {
        info!(store_id = %store.id, name = %store.name, "store registered");
        self.stores.insert(store.id.clone(), store.clone());
        store
    }

    pub fn store(&self, store_id: &str) -> Option<Store> {
        self.stores.get(store_id).map(|entry| entry.value().clone())
    }

    /// Edits a store profile. A new location is copied onto every listing of the store.
    pub fn update_store(&self, store_id: &str, update: StoreUpdate) -> Result<Store, CatalogError> {
        let mut store = self
            .store(store_id)
            .ok_or_else(|| CatalogError::StoreNotFound(store_id.to_string()))?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(CatalogError::InvalidStore("name cannot be empty".to_string()));
            }
            store.name = name.trim().to_string();
        }
        if let Some(location) = update.location {
            if !location.is_valid() {
                return Err(CatalogError::InvalidStore(format!(
                    "location out of range: ({}, {})",
                    location.lat, location.lng
                )));
            }
            store.location = location;
        }
        if update.address.is_some() {
            store.address = update.address;
        }

        self.stores.insert(store.id.clone(), store.clone());

        let mut moved = 0usize;
        for mut entry in self.listings.iter_mut() {
            if entry.store_id == store.id && entry.location != store.location {
                entry.location = store.location;
                moved += 1;
            }
        }

        info!(store_id = %store.id, moved_listings = moved, "store updated");
        Ok(store)
    }

    pub fn stores_near(&self, origin: &Coordinate, radius_km: f64) -> Vec<NearbyStore> {
        let mut nearby: Vec<NearbyStore> = self
            .stores
            .iter()
            .map(|entry| NearbyStore {
                distance_km: distance_km(origin, &entry.value().location),
                store: entry.value().clone(),
            })
            .filter(|nearby| nearby.distance_km <= radius_km)
            .collect();

        nearby.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.store.id.cmp(&b.store.id))
        });
        nearby
    }

    pub fn post_listing(&self, mut listing: Listing) -> Result<Listing, CatalogError> {
        let store = self
            .stores
            .get(&listing.store_id)
            .ok_or_else(|| CatalogError::UnknownStore(listing.store_id.clone()))?;

        listing.check_invariants().map_err(CatalogError::InvalidListing)?;
        listing.location = store.location;
        drop(store);

        info!(listing_id = %listing.id, store_id = %listing.store_id, "listing posted");
        self.listings.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }

    pub fn listing(&self, listing_id: &str) -> Option<Listing> {
        self.listings.get(listing_id).map(|entry| entry.value().clone())
    }

    pub fn listings_for_store(&self, store_id: &str) -> Vec<Listing> {
        let mut listings: Vec<Listing> = self
            .listings
            .iter()
            .filter(|entry| entry.value().store_id == store_id)
            .map(|entry| entry.value().clone())
            .collect();

        listings.sort_by_key(|listing| (Reverse(listing.created_at), listing.id.clone()));
        listings
    }

    pub fn update_quantity(
        &self,
        listing_id: &str,
        quantity: u32,
    ) -> Result<Listing, CatalogError> {
        let mut listing = self
            .listings
            .get_mut(listing_id)
            .ok_or_else(|| CatalogError::NotFound(listing_id.to_string()))?;

        listing.available_quantity = quantity;
        Ok(listing.clone())
    }

    /// Applies a partial edit; the stored listing is untouched if the result is invalid.
    pub fn update_listing(
        &self,
        listing_id: &str,
        update: ListingUpdate,
    ) -> Result<Listing, CatalogError> {
        let mut entry = self
            .listings
            .get_mut(listing_id)
            .ok_or_else(|| CatalogError::NotFound(listing_id.to_string()))?;

        let mut edited = entry.value().clone();
        update.apply_to(&mut edited);
        edited.check_invariants().map_err(CatalogError::InvalidListing)?;

        *entry = edited.clone();
        drop(entry);

        info!(listing_id = %edited.id, "listing updated");
        Ok(edited)
    }

    pub fn remove_listing(&self, listing_id: &str) -> Result<Listing, CatalogError> {
        self.listings
            .remove(listing_id)
            .map(|(_, listing)| listing)
            .ok_or_else(|| CatalogError::NotFound(listing_id.to_string()))
    }

    pub fn listing_count(&self) -> usize {
        self.listings.len()
    }

    pub fn store_count(&self) -> usize {
        self.stores.len()
    }
}

#[async_trait]
impl ListingSource for MemoryCatalog {
    async fn fetch_candidates(
        &self,
        origin: &Coordinate,
        radius_km: f64,
    ) -> Result<CandidateSet, SourceError> {
        let bbox = bounding_box(origin, radius_km);

        let listings: Vec<Listing> = self
            .listings
            .iter()
            .filter(|entry| bbox.contains(&entry.value().location))
            .map(|entry| entry.value().clone())
            .collect();

        let stores = listings
            .iter()
            .filter_map(|listing| self.store(&listing.store_id))
            .map(|store| (store.id.clone(), store))
            .collect();

        Ok(CandidateSet { listings, stores })
    }
}
