use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::engine::expiry::assess;
use crate::geo::distance_km;
use crate::models::filter::SortKey;
use crate::models::listing::{Coordinate, Listing};
use crate::models::ranked::RankedListing;

/// Orders `listings` by `sort_by`, then `created_at`, then `id`, and attaches
/// the derived display fields. The output is a permutation of the input.
pub fn rank(
    listings: Vec<Listing>,
    origin: &Coordinate,
    sort_by: SortKey,
    now: DateTime<Utc>,
) -> Vec<RankedListing> {
    let mut ranked: Vec<RankedListing> = listings
        .into_iter()
        .map(|listing| enrich(listing, origin, now))
        .collect();

    ranked.sort_by(|a, b| primary_order(a, b, sort_by).then_with(|| tie_break(a, b)));
    ranked
}

fn enrich(listing: Listing, origin: &Coordinate, now: DateTime<Utc>) -> RankedListing {
    let urgency = assess(listing.expiry_at, now);

    RankedListing {
        distance_km: distance_km(origin, &listing.location),
        urgency_tier: urgency.tier,
        days_until_expiry: urgency.days_remaining,
        expiry_label: urgency.label(),
        discount_percent: discount_percent(listing.price, listing.original_price),
        savings: listing.original_price.saturating_sub(listing.price),
        listing,
    }
}

fn primary_order(a: &RankedListing, b: &RankedListing, sort_by: SortKey) -> Ordering {
    match sort_by {
        SortKey::Distance => a.distance_km.total_cmp(&b.distance_km),
        SortKey::Price => a.listing.price.cmp(&b.listing.price),
        SortKey::Expiry => a.listing.expiry_at.cmp(&b.listing.expiry_at),
    }
}

fn tie_break(a: &RankedListing, b: &RankedListing) -> Ordering {
    a.listing
        .created_at
        .cmp(&b.listing.created_at)
        .then_with(|| a.listing.id.cmp(&b.listing.id))
}

/// Rounded percentage off the original price, half away from zero.
pub fn discount_percent(price: u32, original_price: u32) -> u8 {
    if original_price == 0 {
        return 0;
    }

    let original = u64::from(original_price);
    let off = original.saturating_sub(u64::from(price));
    let percent = (off * 200 + original) / (original * 2);

    percent.min(100) as u8
}
