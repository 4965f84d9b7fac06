use serde::{Deserialize, Serialize};

use crate::models::listing::Listing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyTier {
    Expired,
    Today,
    Soon,
    Normal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub distance_km: f64,
    pub urgency_tier: UrgencyTier,
    pub days_until_expiry: i64,
    pub expiry_label: String,
    pub discount_percent: u8,
    pub savings: u32,
}
