//! Cart and wishlist state.
//!
//! A cart holds at most one line per product id; a line never carries a
//! quantity below one. The wishlist is a set of products keyed by id.

use crate::models::{Money, Product, ProductId};

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Money {
        self.product.price.times(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Units across all lines
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.find(product_id).map(|i| i.quantity).unwrap_or(0)
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product.id == product_id)
    }

    /// Add units of a product, merging into an existing line.
    /// No stock check is made.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(existing) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem {
                product: product.clone(),
                quantity,
            });
        }
    }

    /// Replace a line's quantity; zero or below removes the line.
    /// Unknown ids are ignored.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| &i.product.id == product_id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    /// Shift a line's quantity by `delta` (the +/- controls)
    pub fn adjust_quantity(&mut self, product_id: &ProductId, delta: i64) {
        if let Some(current) = self.find(product_id).map(|i| i.quantity) {
            self.update_quantity(product_id, i64::from(current) + delta);
        }
    }

    /// Returns false if the product was not in the cart
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product.id != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Outcome of a wishlist toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistChange {
    Added,
    Removed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wishlist {
    items: Vec<Product>,
}

impl Wishlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|p| &p.id == product_id)
    }

    pub fn toggle(&mut self, product: &Product) -> WishlistChange {
        if self.remove(&product.id) {
            WishlistChange::Removed
        } else {
            self.items.push(product.clone());
            WishlistChange::Added
        }
    }

    /// Returns false if already present
    pub fn add(&mut self, product: &Product) -> bool {
        if self.contains(&product.id) {
            return false;
        }
        self.items.push(product.clone());
        true
    }

    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|p| &p.id != product_id);
        self.items.len() != before
    }

    /// First `limit` saved products, in the order they were added
    pub fn preview(&self, limit: usize) -> &[Product] {
        &self.items[..self.items.len().min(limit)]
    }
}
