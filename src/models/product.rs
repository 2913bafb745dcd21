/// Product model.
/// Products are read-only once loaded from the catalog source.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Money;

/// Product identifier. The product feed sends either numbers or strings;
/// both normalize to the same textual id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawProductId", into = "String")]
pub struct ProductId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProductId {
    Number(u64),
    Text(String),
}

impl From<RawProductId> for ProductId {
    fn from(raw: RawProductId) -> Self {
        match raw {
            RawProductId::Number(n) => ProductId(n.to_string()),
            RawProductId::Text(s) => ProductId(s),
        }
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        ProductId(s.trim().to_string())
    }
}

impl From<u64> for ProductId {
    fn from(n: u64) -> Self {
        ProductId(n.to_string())
    }
}

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stock information: feeds carry either an in-stock flag or a unit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Availability {
    Flag(bool),
    Count(u32),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        match self {
            Availability::Flag(in_stock) => *in_stock,
            Availability::Count(count) => *count > 0,
        }
    }
}

impl Default for Availability {
    fn default() -> Self {
        Availability::Flag(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Money>,
    /// Advertised discount percent, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<u32>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub store: String,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default, rename = "inStock", alias = "stock")]
    pub availability: Availability,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Money) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            price,
            original_price: None,
            discount: None,
            category: String::new(),
            store: String::new(),
            rating: 0.0,
            reviews: 0,
            availability: Availability::default(),
            description: String::new(),
            image: String::new(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn with_store(mut self, store: &str) -> Self {
        self.store = store.to_string();
        self
    }

    pub fn with_rating(mut self, rating: f32, reviews: u32) -> Self {
        self.rating = rating;
        self.reviews = reviews;
        self
    }

    pub fn with_original_price(mut self, original: Money, discount: u32) -> Self {
        self.original_price = Some(original);
        self.discount = Some(discount);
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn in_stock(&self) -> bool {
        self.availability.is_available()
    }
}
