//! # Cart
//!
//! The cart snapshot a coupon is evaluated against.
//!
//! ## Invariants
//! - Every line has quantity > 0 (and at most [`MAX_ITEM_QUANTITY`])
//! - A product appears on at most one line; adding it again increases the
//!   quantity of the existing line and keeps that line's price
//! - At most [`MAX_CART_LINES`] lines
//!
//! The invariants hold for carts built in code and for carts deserialized
//! from JSON, since both go through [`Cart::add_line`].
//!
//! ## Wire Shape
//! ```json
//! { "items": [ { "product_id": "A", "quantity": 2, "price": 10000 } ] }
//! ```
//! `price` (cents) is optional. When present it is the price used for that
//! line; when absent the engine resolves the price from the catalog.
//!
//! [`MAX_ITEM_QUANTITY`]: crate::MAX_ITEM_QUANTITY
//! [`MAX_CART_LINES`]: crate::MAX_CART_LINES

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    validate_cart_size, validate_price_cents, validate_product_id, validate_quantity,
    ValidationResult,
};

// =============================================================================
// Cart Line
// =============================================================================

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
    /// Caller-supplied unit price. Absent = resolve from the catalog.
    #[serde(rename = "price", default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Money>,
}

impl CartLine {
    /// A line whose price comes from the catalog.
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
            unit_price: None,
        }
    }

    /// A line carrying its own unit price.
    pub fn priced(product_id: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
            unit_price: Some(unit_price),
        }
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_product_id(&self.product_id)?;
        validate_quantity(self.quantity)?;
        if let Some(price) = self.unit_price {
            validate_price_cents(price.cents())?;
        }
        Ok(())
    }
}

// =============================================================================
// Cart
// =============================================================================

/// An ordered, validated sequence of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CartPayload", into = "CartPayload")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Builds a cart from lines, validating and merging as it goes.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> ValidationResult<Self> {
        let mut cart = Cart::new();
        for line in lines {
            cart.add_line(line)?;
        }
        Ok(cart)
    }

    /// Adds a line, or increases the quantity of the product's existing line.
    pub fn add_line(&mut self, line: CartLine) -> ValidationResult<()> {
        line.validate()?;

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            let merged = existing.quantity + line.quantity;
            validate_quantity(merged)?;
            existing.quantity = merged;
            return Ok(());
        }

        validate_cart_size(self.lines.len())?;
        self.lines.push(line);
        Ok(())
    }

    /// Lines in insertion order.
    #[inline]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for a product, if the cart contains it.
    pub fn line_for(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Quantity of a product in the cart (0 if absent).
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.line_for(product_id).map_or(0, |l| l.quantity)
    }

    /// Whether any line is for the given product.
    pub fn contains(&self, product_id: &str) -> bool {
        self.line_for(product_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all line quantities.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// Serialized form of [`Cart`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CartPayload {
    #[serde(default)]
    items: Vec<CartLine>,
}

impl TryFrom<CartPayload> for Cart {
    type Error = ValidationError;

    fn try_from(payload: CartPayload) -> Result<Self, Self::Error> {
        Cart::from_lines(payload.items)
    }
}

impl From<Cart> for CartPayload {
    fn from(cart: Cart) -> Self {
        CartPayload { items: cart.lines }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
