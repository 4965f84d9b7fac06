use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Food category. Unknown names are kept as `Other` so the set stays open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    PreparedFood,
    Bakery,
    Bento,
    Dessert,
    Beverage,
    Produce,
    Fruit,
    Meat,
    Fish,
    Dairy,
    Other(String),
}

const KNOWN_CATEGORIES: [(Category, &str, &str); 10] = [
    (Category::PreparedFood, "prepared-food", "惣菜"),
    (Category::Bakery, "bakery", "パン"),
    (Category::Bento, "bento", "お弁当"),
    (Category::Dessert, "dessert", "デザート"),
    (Category::Beverage, "beverage", "飲料"),
    (Category::Produce, "produce", "野菜"),
    (Category::Fruit, "fruit", "果物"),
    (Category::Meat, "meat", "肉"),
    (Category::Fish, "fish", "魚"),
    (Category::Dairy, "dairy", "乳製品"),
];

impl Category {
    /// Accepts the kebab-case name or the display label.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        KNOWN_CATEGORIES
            .iter()
            .find(|(_, name, label)| normalized == *name || normalized == *label)
            .map(|(category, _, _)| category.clone())
            .unwrap_or(Category::Other(normalized))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Other(name) => name.as_str(),
            known => KNOWN_CATEGORIES
                .iter()
                .find(|(category, _, _)| category == known)
                .map(|(_, name, _)| *name)
                .unwrap_or_default(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Category::Other(name) => name.as_str(),
            known => KNOWN_CATEGORIES
                .iter()
                .find(|(category, _, _)| category == known)
                .map(|(_, _, label)| *label)
                .unwrap_or_default(),
        }
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Category::parse(&raw)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub location: Coordinate,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub location: Option<Coordinate>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyStore {
    #[serde(flatten)]
    pub store: Store,
    pub distance_km: f64,
}

/// One postable food item. Prices are whole currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: u32,
    pub original_price: u32,
    pub available_quantity: u32,
    pub expiry_at: DateTime<Utc>,
    pub category: Category,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub store_id: String,
    pub location: Coordinate,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("listing id cannot be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Err(format!("listing {} has an empty name", self.id));
        }
        if self.price > self.original_price {
            return Err(format!(
                "listing {} price {} exceeds original price {}",
                self.id, self.price, self.original_price
            ));
        }
        Ok(())
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_quantity == 0
    }
}

/// Partial edit of a listing. The owning store and location are not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<u32>,
    pub original_price: Option<u32>,
    pub quantity: Option<u32>,
    pub expiry_at: Option<DateTime<Utc>>,
    pub category: Option<Category>,
    pub tags: Option<BTreeSet<String>>,
    pub image_url: Option<String>,
}

impl ListingUpdate {
    pub fn apply_to(self, listing: &mut Listing) {
        if let Some(name) = self.name {
            listing.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            listing.description = description;
        }
        if let Some(price) = self.price {
            listing.price = price;
        }
        if let Some(original_price) = self.original_price {
            listing.original_price = original_price;
        }
        if let Some(quantity) = self.quantity {
            listing.available_quantity = quantity;
        }
        if let Some(expiry_at) = self.expiry_at {
            listing.expiry_at = expiry_at;
        }
        if let Some(category) = self.category {
            listing.category = category;
        }
        if let Some(tags) = self.tags {
            listing.tags = tags;
        }
        if self.image_url.is_some() {
            listing.image_url = self.image_url;
        }
    }
}
