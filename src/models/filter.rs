use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::listing::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Distance,
    Price,
    Expiry,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "distance" => Ok(SortKey::Distance),
            "price" => Ok(SortKey::Price),
            "expiry" => Ok(SortKey::Expiry),
            other => Err(format!(
                "unknown sort key: {other}, expected distance/price/expiry"
            )),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Distance => "distance",
            SortKey::Price => "price",
            SortKey::Expiry => "expiry",
        };
        f.write_str(name)
    }
}

/// `max_price_inclusive` is signed so that a negative cap coming from an outer
/// layer is reported instead of being wrapped or clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub category: Option<Category>,
    pub max_price_inclusive: i64,
    pub max_distance_km: f64,
    #[serde(default)]
    pub text_query: Option<String>,
    #[serde(default)]
    pub sort_by: SortKey,
}

impl FilterSpec {
    pub fn new(max_distance_km: f64, max_price_inclusive: i64) -> Self {
        Self {
            category: None,
            max_price_inclusive,
            max_distance_km,
            text_query: None,
            sort_by: SortKey::default(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_text_query(mut self, query: impl Into<String>) -> Self {
        self.text_query = Some(query.into());
        self
    }

    pub fn sorted_by(mut self, sort_by: SortKey) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.max_distance_km.is_finite() || self.max_distance_km <= 0.0 {
            return Err(format!(
                "max_distance_km must be a positive number, got {}",
                self.max_distance_km
            ));
        }
        if self.max_price_inclusive < 0 {
            return Err(format!(
                "max_price_inclusive must be >= 0, got {}",
                self.max_price_inclusive
            ));
        }
        Ok(())
    }

    pub fn normalized_query(&self) -> Option<String> {
        self.text_query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .map(str::to_lowercase)
    }
}
