//! Product catalog: where products come from and how they are browsed.
//!
//! Products are loaded once through a [`ProductRepository`]. The remote
//! repository is the room service's product endpoint; when it fails, the
//! built-in sample catalog is used instead and the load reports why.

use std::collections::HashMap;
use std::fmt;

use crate::error::{ClientError, Result};
use crate::models::{Money, Product, ProductId};
use crate::sample;

pub const DEFAULT_PAGE_SIZE: usize = 12;

const SUGGESTED_PRODUCTS: usize = 5;
const SUGGESTED_CATEGORIES: usize = 3;
const SUGGESTED_STORES: usize = 3;

/// A source of products.
#[allow(async_fn_in_trait)]
pub trait ProductRepository {
    async fn load(&self) -> Result<Vec<Product>>;
}

/// Products held in memory (sample data, tests).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Vec<Product>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn sample() -> Self {
        Self::new(sample::products())
    }
}

impl ProductRepository for InMemoryCatalog {
    async fn load(&self) -> Result<Vec<Product>> {
        Ok(self.products.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Remote,
    /// The primary source failed; sample data is in use.
    Fallback { reason: String },
}

#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub products: Vec<Product>,
    pub source: CatalogSource,
}

/// Load from `primary`, substituting `fallback` on any failure.
pub async fn load_catalog<P, F>(primary: &P, fallback: &F) -> Result<CatalogLoad>
where
    P: ProductRepository,
    F: ProductRepository,
{
    match primary.load().await {
        Ok(products) => {
            log::info!("Loaded {} products", products.len());
            Ok(CatalogLoad {
                products,
                source: CatalogSource::Remote,
            })
        }
        Err(e) => {
            log::warn!("Product fetch failed, using sample data: {}", e);
            let products = fallback.load().await?;
            Ok(CatalogLoad {
                products,
                source: CatalogSource::Fallback {
                    reason: e.to_string(),
                },
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Source order
    #[default]
    Relevance,
    PriceLow,
    PriceHigh,
    Rating,
    /// Most reviewed first
    Popularity,
}

impl SortKey {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "relevance" => Ok(SortKey::Relevance),
            "price-low" => Ok(SortKey::PriceLow),
            "price-high" => Ok(SortKey::PriceHigh),
            "rating" => Ok(SortKey::Rating),
            "popularity" => Ok(SortKey::Popularity),
            other => Err(ClientError::ValidationError(format!(
                "Unknown sort key: {} (relevance, price-low, price-high, rating, popularity)",
                other
            ))),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            SortKey::Relevance => "relevance",
            SortKey::PriceLow => "price-low",
            SortKey::PriceHigh => "price-high",
            SortKey::Rating => "rating",
            SortKey::Popularity => "popularity",
        };
        f.write_str(key)
    }
}

/// Filters, ordering and page selection for a product listing.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    /// `None` or `"all"` means every category
    pub category: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub text: Option<String>,
    pub sort: SortKey,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        ProductQuery {
            category: None,
            min_price: None,
            max_price: None,
            text: None,
            sort: SortKey::Relevance,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductQuery {
    fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category.as_deref() {
            if category != "all" && product.category != category {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let needle = text.to_lowercase();
                [&product.name, &product.description, &product.store]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<'a> {
    pub items: Vec<&'a Product>,
    /// 1-based, clamped into range
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suggestions<'a> {
    pub products: Vec<&'a Product>,
    pub categories: Vec<&'a str>,
    pub stores: Vec<&'a str>,
}

impl Suggestions<'_> {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.categories.is_empty() && self.stores.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    source: CatalogSource,
}

impl Catalog {
    pub fn new(load: CatalogLoad) -> Self {
        Catalog {
            products: load.products,
            source: load.source,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn is_sample_data(&self) -> bool {
        matches!(self.source, CatalogSource::Fallback { .. })
    }

    pub fn find(&self, id: &ProductId) -> Result<&Product> {
        self.products
            .iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| ClientError::ProductNotFound(id.to_string()))
    }

    /// `"all"` followed by each distinct category in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut categories = vec!["all"];
        for product in &self.products {
            let category = product.category.as_str();
            if !category.is_empty() && !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }

    pub fn browse(&self, query: &ProductQuery) -> Page<'_> {
        let mut matching: Vec<&Product> =
            self.products.iter().filter(|p| query.matches(p)).collect();

        // sort_by is stable, so ties keep source order
        match query.sort {
            SortKey::Relevance => {}
            SortKey::PriceLow => matching.sort_by_key(|p| p.price),
            SortKey::PriceHigh => matching.sort_by(|a, b| b.price.cmp(&a.price)),
            SortKey::Rating => matching.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
            SortKey::Popularity => matching.sort_by(|a, b| b.reviews.cmp(&a.reviews)),
        }

        let page_size = query.page_size.max(1);
        let total_items = matching.len();
        let total_pages = total_items.div_ceil(page_size).max(1);
        let page = query.page.clamp(1, total_pages);

        let items = matching
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        Page {
            items,
            page,
            total_pages,
            total_items,
        }
    }

    /// Search-as-you-type suggestions
    pub fn suggest(&self, query: &str) -> Suggestions<'_> {
        let needle = query.trim().to_lowercase();
        let hit = |field: &str| needle.is_empty() || field.to_lowercase().contains(&needle);

        let products = self
            .products
            .iter()
            .filter(|p| hit(&p.name))
            .take(SUGGESTED_PRODUCTS)
            .collect();

        let mut categories: Vec<&str> = Vec::new();
        let mut stores: Vec<&str> = Vec::new();
        for product in &self.products {
            let category = product.category.as_str();
            if !category.is_empty() && hit(category) && !categories.contains(&category) {
                categories.push(category);
            }
            let store = product.store.as_str();
            if !store.is_empty() && hit(store) && !stores.contains(&store) {
                stores.push(store);
            }
        }
        categories.truncate(SUGGESTED_CATEGORIES);
        stores.truncate(SUGGESTED_STORES);

        Suggestions {
            products,
            categories,
            stores,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reaction {
    Like,
    Dislike,
}

/// Like/dislike counters per product.
#[derive(Debug, Clone, Default)]
pub struct ReactionTally {
    counts: HashMap<(ProductId, Reaction), u32>,
}

impl ReactionTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new count
    pub fn react(&mut self, product_id: &ProductId, reaction: Reaction) -> u32 {
        let count = self
            .counts
            .entry((product_id.clone(), reaction))
            .or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, product_id: &ProductId, reaction: Reaction) -> u32 {
        self.counts
            .get(&(product_id.clone(), reaction))
            .copied()
            .unwrap_or(0)
    }
}
