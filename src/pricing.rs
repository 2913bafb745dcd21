//! Checkout pricing.
//!
//! A breakdown is derived from the cart's current lines every time it is
//! asked for; nothing here caches totals.

use crate::cart::Cart;
use crate::error::{ClientError, Result};
use crate::models::Money;

/// Flat sales tax, in basis points (8%)
pub const TAX_RATE_BPS: u32 = 800;

/// Subtotals strictly above this ship free
pub const FREE_SHIPPING_THRESHOLD: Money = Money::from_cents(5_000);

pub const FLAT_SHIPPING: Money = Money::from_cents(999);

const PROMO_CODES: &[(&str, u32)] = &[("SAVE10", 10), ("WELCOME20", 20), ("SUMMER15", 15)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCode {
    pub code: String,
    pub percent: u32,
}

impl PromoCode {
    /// Case-insensitive lookup in the fixed promo table
    pub fn lookup(raw: &str) -> Option<PromoCode> {
        let code = raw.trim().to_uppercase();
        PROMO_CODES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(known, percent)| PromoCode {
                code: known.to_string(),
                percent: *percent,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
    pub promo: Option<PromoCode>,
}

impl PriceBreakdown {
    pub fn compute(cart: &Cart, promo: Option<&PromoCode>) -> Self {
        let subtotal: Money = cart.items().iter().map(|item| item.line_total()).sum();
        let tax = subtotal.basis_points(TAX_RATE_BPS);
        let shipping = if subtotal > FREE_SHIPPING_THRESHOLD {
            Money::ZERO
        } else {
            FLAT_SHIPPING
        };
        let discount = promo
            .map(|p| subtotal.percent(p.percent))
            .unwrap_or(Money::ZERO);

        PriceBreakdown {
            subtotal,
            tax,
            shipping,
            discount,
            total: subtotal + tax + shipping - discount,
            promo: promo.cloned(),
        }
    }

    pub fn free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }

    /// How much more would unlock free shipping, if it is being charged
    pub fn amount_to_free_shipping(&self) -> Option<Money> {
        if self.free_shipping() {
            None
        } else {
            Some(FREE_SHIPPING_THRESHOLD.saturating_sub(self.subtotal))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutReview {
    EmptyCart,
    Ready(PriceBreakdown),
}

/// Promo selection for one cart.
#[derive(Debug, Clone, Default)]
pub struct Checkout {
    promo: Option<PromoCode>,
}

impl Checkout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn promo(&self) -> Option<&PromoCode> {
        self.promo.as_ref()
    }

    /// Unknown codes fail and leave the current promo in place.
    pub fn apply_promo(&mut self, code: &str) -> Result<&PromoCode> {
        let promo = PromoCode::lookup(code)
            .ok_or_else(|| ClientError::InvalidPromo(code.trim().to_string()))?;
        log::info!("Applied promo {} ({}% off)", promo.code, promo.percent);
        Ok(self.promo.insert(promo))
    }

    pub fn remove_promo(&mut self) -> Option<PromoCode> {
        self.promo.take()
    }

    pub fn review(&self, cart: &Cart) -> CheckoutReview {
        if cart.is_empty() {
            return CheckoutReview::EmptyCart;
        }
        CheckoutReview::Ready(PriceBreakdown::compute(cart, self.promo.as_ref()))
    }
}
