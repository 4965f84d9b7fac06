use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::engine::expiry::classify;
use crate::geo::distance_km;
use crate::models::filter::FilterSpec;
use crate::models::listing::{Coordinate, Listing, Store};
use crate::models::ranked::UrgencyTier;

pub trait StoreDirectory {
    fn store_name(&self, store_id: &str) -> Option<&str>;
}

impl StoreDirectory for HashMap<String, Store> {
    fn store_name(&self, store_id: &str) -> Option<&str> {
        self.get(store_id).map(|store| store.name.as_str())
    }
}

pub fn apply<S>(
    listings: Vec<Listing>,
    stores: &S,
    origin: &Coordinate,
    spec: &FilterSpec,
    now: DateTime<Utc>,
) -> Vec<Listing>
where
    S: StoreDirectory + ?Sized,
{
    let query = spec.normalized_query();

    listings
        .into_iter()
        .filter(|listing| matches(listing, stores, origin, spec, query.as_deref(), now))
        .collect()
}

fn matches<S>(
    listing: &Listing,
    stores: &S,
    origin: &Coordinate,
    spec: &FilterSpec,
    query: Option<&str>,
    now: DateTime<Utc>,
) -> bool
where
    S: StoreDirectory + ?Sized,
{
    if listing.is_sold_out() {
        return false;
    }

    if classify(listing.expiry_at, now) == UrgencyTier::Expired {
        return false;
    }

    if i64::from(listing.price) > spec.max_price_inclusive {
        return false;
    }

    if let Some(category) = &spec.category {
        if *category != listing.category {
            return false;
        }
    }

    if distance_km(origin, &listing.location) > spec.max_distance_km {
        return false;
    }

    match query {
        None => true,
        Some(query) => {
            listing.name.to_lowercase().contains(query)
                || stores
                    .store_name(&listing.store_id)
                    .is_some_and(|name| name.to_lowercase().contains(query))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::apply;
    use crate::models::filter::FilterSpec;
    use crate::models::listing::{Category, Coordinate, Listing, Store};

    const ORIGIN: Coordinate = Coordinate::new(35.6762, 139.6503);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
    }

    fn north_of_origin(km: f64) -> Coordinate {
        Coordinate::new(ORIGIN.lat + (km / 6_371.0).to_degrees(), ORIGIN.lng)
    }

    fn listing(id: &str, km: f64, price: u32) -> Listing {
        Listing {
            id: id.to_string(),
            name: format!("item {id}"),
            description: String::new(),
            price,
            original_price: price * 2,
            available_quantity: 3,
            expiry_at: now() + Duration::days(2),
            category: Category::Bento,
            tags: BTreeSet::new(),
            store_id: "store-1".to_string(),
            location: north_of_origin(km),
            image_url: None,
            created_at: now() - Duration::hours(1),
        }
    }

    fn stores() -> HashMap<String, Store> {
        let mut stores = HashMap::new();
        stores.insert(
            "store-1".to_string(),
            Store {
                id: "store-1".to_string(),
                name: "Sunrise Deli".to_string(),
                location: ORIGIN,
                address: None,
            },
        );
        stores
    }

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn distance_cap_excludes_far_listing() {
        let candidates = vec![listing("a", 3.0, 300), listing("b", 12.0, 200)];
        let spec = FilterSpec::new(5.0, 1000);

        let result = apply(candidates, &stores(), &ORIGIN, &spec, now());

        assert_eq!(ids(&result), vec!["a"]);
    }

    #[test]
    fn price_cap_is_inclusive() {
        let candidates = vec![listing("a", 1.0, 500), listing("b", 1.0, 501)];
        let spec = FilterSpec::new(5.0, 500);

        let result = apply(candidates, &stores(), &ORIGIN, &spec, now());

        assert_eq!(ids(&result), vec!["a"]);
    }

    #[test]
    fn sold_out_and_expired_listings_are_dropped() {
        let mut sold_out = listing("sold-out", 1.0, 100);
        sold_out.available_quantity = 0;
        let mut expired = listing("expired", 1.0, 100);
        expired.expiry_at = now() - Duration::minutes(5);
        let fresh = listing("fresh", 1.0, 100);

        let spec = FilterSpec::new(5.0, 1000);
        let result = apply(vec![sold_out, expired, fresh], &stores(), &ORIGIN, &spec, now());

        assert_eq!(ids(&result), vec!["fresh"]);
    }

    #[test]
    fn listing_expired_under_a_second_ago_is_dropped() {
        let mut just_expired = listing("just-expired", 1.0, 100);
        just_expired.expiry_at = now() - Duration::milliseconds(500);
        let mut expiring_now = listing("expiring-now", 1.0, 100);
        expiring_now.expiry_at = now();

        let spec = FilterSpec::new(5.0, 1000);
        let result = apply(vec![just_expired, expiring_now], &stores(), &ORIGIN, &spec, now());

        assert_eq!(ids(&result), vec!["expiring-now"]);
    }

    #[test]
    fn category_must_match_when_set() {
        let mut bread = listing("bread", 1.0, 100);
        bread.category = Category::Bakery;
        let bento = listing("bento", 1.0, 100);

        let spec = FilterSpec::new(5.0, 1000).with_category(Category::Bakery);
        let result = apply(vec![bread.clone(), bento.clone()], &stores(), &ORIGIN, &spec, now());
        assert_eq!(ids(&result), vec!["bread"]);

        let unset = FilterSpec::new(5.0, 1000);
        let result = apply(vec![bread, bento], &stores(), &ORIGIN, &unset, now());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn text_query_matches_listing_or_store_name() {
        let mut onigiri = listing("onigiri", 1.0, 100);
        onigiri.name = "Salmon ONIGIRI".to_string();
        onigiri.store_id = "unknown-store".to_string();
        let croissant = listing("croissant", 1.0, 100);

        let by_name = FilterSpec::new(5.0, 1000).with_text_query("onigiri");
        let result = apply(
            vec![onigiri.clone(), croissant.clone()],
            &stores(),
            &ORIGIN,
            &by_name,
            now(),
        );
        assert_eq!(ids(&result), vec!["onigiri"]);

        let by_store = FilterSpec::new(5.0, 1000).with_text_query("sunrise");
        let result = apply(vec![onigiri, croissant], &stores(), &ORIGIN, &by_store, now());
        assert_eq!(ids(&result), vec!["croissant"]);
    }

    #[test]
    fn no_match_returns_empty() {
        let spec = FilterSpec::new(0.5, 1000);
        let result = apply(vec![listing("a", 3.0, 300)], &stores(), &ORIGIN, &spec, now());
        assert!(result.is_empty());
    }

    #[test]
    fn tightening_caps_never_grows_the_result() {
        let candidates: Vec<Listing> = (0..20)
            .map(|i| listing(&format!("l{i}"), f64::from(i) * 0.7, 50 + i * 40))
            .collect();

        let mut previous = usize::MAX;
        for max_km in [20.0, 10.0, 6.0, 3.0, 1.0, 0.1] {
            let spec = FilterSpec::new(max_km, 1000);
            let count = apply(candidates.clone(), &stores(), &ORIGIN, &spec, now()).len();
            assert!(count <= previous);
            previous = count;
        }

        let mut previous = usize::MAX;
        for max_price in [2000, 700, 400, 100, 0] {
            let spec = FilterSpec::new(50.0, max_price);
            let count = apply(candidates.clone(), &stores(), &ORIGIN, &spec, now()).len();
            assert!(count <= previous);
            previous = count;
        }
    }
}
