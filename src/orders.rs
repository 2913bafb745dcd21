/// Order history and order placement.

use chrono::{Datelike, Local};

use crate::cart::Cart;
use crate::error::{ClientError, Result};
use crate::models::{Order, OrderLine, OrderStatus};
use crate::pricing::{Checkout, CheckoutReview};
use crate::sample;

#[derive(Debug, Clone)]
pub struct OrderHistory {
    orders: Vec<Order>,
    next_sequence: u32,
}

impl Default for OrderHistory {
    fn default() -> Self {
        Self::with_orders(sample::orders())
    }
}

impl OrderHistory {
    pub fn with_orders(orders: Vec<Order>) -> Self {
        let next_sequence = orders.len() as u32 + 1;
        OrderHistory {
            orders,
            next_sequence,
        }
    }

    /// Newest first
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn active(&self) -> Vec<&Order> {
        self.orders.iter().filter(|o| o.status.is_active()).collect()
    }

    pub fn completed(&self) -> Vec<&Order> {
        self.orders.iter().filter(|o| !o.status.is_active()).collect()
    }

    pub fn record(&mut self, order: Order) {
        self.orders.insert(0, order);
    }

    fn next_id(&mut self, year: i32) -> String {
        let id = format!("ORD-{}-{:03}", year, self.next_sequence);
        self.next_sequence += 1;
        id
    }

    /// Turn the cart into a processing order. Clears the cart and the
    /// applied promo on success.
    pub fn place_order(&mut self, cart: &mut Cart, checkout: &mut Checkout) -> Result<&Order> {
        let breakdown = match checkout.review(cart) {
            CheckoutReview::EmptyCart => {
                return Err(ClientError::ValidationError(
                    "Cannot place an order with an empty cart".to_string(),
                ))
            }
            CheckoutReview::Ready(breakdown) => breakdown,
        };

        let today = Local::now().date_naive();
        let order = Order {
            id: self.next_id(today.year()),
            date: today,
            status: OrderStatus::Processing,
            items: cart
                .items()
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product.id.clone(),
                    name: item.product.name.clone(),
                    price: item.product.price,
                    quantity: item.quantity,
                })
                .collect(),
            total: breakdown.total,
            tracking_number: None,
            estimated_delivery: None,
        };

        log::info!("Placed order {} for {}", order.id, order.total);
        cart.clear();
        checkout.remove_promo();
        self.record(order);
        Ok(&self.orders[0])
    }
}
