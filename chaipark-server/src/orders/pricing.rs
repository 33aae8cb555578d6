//! Order pricing using rust_decimal for precision
//!
//! Line totals and order totals are computed in `Decimal` and rounded to
//! 2 decimal places (half away from zero). Tax and discount are carried on
//! the record but always zero for now.

use rust_decimal::prelude::*;
use shared::models::MenuItem;
use shared::order::{OrderItem, OrderItemInput, Pricing};
use thiserror::Error;

/// Rounding for monetary values (2 decimal places)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed menu price (₹1,000,000)
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: u32 = 9999;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Line total out of range: {price} x {quantity}")]
    LineOverflow { price: Decimal, quantity: u32 },

    #[error("Order total out of range")]
    TotalOverflow,
}

/// Delivery fee and free-delivery threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingRules {
    /// Flat fee charged when the subtotal does not exceed the threshold
    pub delivery_fee: Decimal,
    /// Subtotal strictly above this ships free
    pub free_delivery_threshold: Decimal,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            delivery_fee: Decimal::from(20),
            free_delivery_threshold: Decimal::from(500),
        }
    }
}

impl PricingRules {
    pub fn delivery_fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal > self.free_delivery_threshold {
            Decimal::ZERO
        } else {
            self.delivery_fee
        }
    }
}

#[inline]
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// price × quantity
///
/// Customization prices are recorded on the line but not added to the total.
pub fn line_total(unit_price: Decimal, quantity: u32) -> Result<Decimal, PricingError> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .map(round_money)
        .ok_or(PricingError::LineOverflow {
            price: unit_price,
            quantity,
        })
}

/// Snapshot a requested line against its menu item
pub fn snapshot_line(
    input: &OrderItemInput,
    menu_item: &MenuItem,
    quantity: u32,
) -> Result<OrderItem, PricingError> {
    let total_price = line_total(menu_item.price, quantity)?;
    Ok(OrderItem {
        menu_item: menu_item.id.clone(),
        name: menu_item.name.clone(),
        price: menu_item.price,
        quantity,
        customization: input.customization.clone(),
        special_instructions: input
            .special_instructions
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        total_price,
    })
}

/// subtotal = Σ totalPrice, fee by threshold, total = subtotal + tax + fee - discount
pub fn price_items(items: &[OrderItem], rules: &PricingRules) -> Result<Pricing, PricingError> {
    let subtotal = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.total_price))
        .map(round_money)
        .ok_or(PricingError::TotalOverflow)?;
    let tax = Decimal::ZERO;
    let discount = Decimal::ZERO;
    let delivery_fee = rules.delivery_fee_for(subtotal);
    let total = subtotal
        .checked_add(tax)
        .and_then(|v| v.checked_add(delivery_fee))
        .and_then(|v| v.checked_sub(discount))
        .map(round_money)
        .ok_or(PricingError::TotalOverflow)?;
    Ok(Pricing {
        subtotal,
        tax,
        delivery_fee,
        discount,
        total,
    })
}
