//! # Discount Engine
//!
//! Decides whether a coupon applies to a cart and computes what it is worth.
//!
//! ## Evaluation Pipeline
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │ coupon, cart │──►│ active and not   │──►│ rule eligible?   │──►│ per-kind     │
//! │ today        │   │ expired?         │   │                  │   │ computation  │
//! └──────────────┘   └────────┬─────────┘   └────────┬─────────┘   └──────┬───────┘
//!                             │ no                   │ no                 │
//!                             ▼                      ▼                    ▼
//!                  CouponExpiredOrInactive   CouponNotApplicable   EvaluationResult
//! ```
//!
//! ## Unit Prices
//! A line that carries a caller-supplied price uses it. Lines without a
//! price, and BxGy get products that are not in the cart, are priced from
//! the catalog. A catalog miss fails the whole evaluation with
//! [`CoreError::ProductNotFound`]; nothing is ever partially applied.
//!
//! ## Per-Kind Formulas
//! ```text
//! cart_wise     discount = subtotal × rate                 (no line attribution)
//! product_wise  line discount = line total × rate          (matching lines only)
//! bxgy          per pair, in order:
//!                 reps   = min(floor(buy_line_qty / buy_qty), limit)
//!                 free   = reps × get_qty
//!                 get line: bonus += free, discount += free × unit_price(get)
//! ```
//! Overlapping BxGy pairs that target the same get product accumulate.
//! Buy quantities are always read from the cart as given, so bonus units
//! earned by one pair never trigger another.
//!
//! ## Overflow
//! All amount arithmetic is checked. Validated carts and coupons stay far
//! below i64 limits; an amount that still overflows (for example a corrupt
//! catalog price) fails the evaluation with
//! [`ValidationError::Overflow`] instead of panicking or wrapping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartLine};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::store::CatalogLookup;
use crate::types::{BxGyPair, Coupon, CouponKind, CouponRule, Percentage};

// =============================================================================
// Result Types
// =============================================================================

/// How one product line fares under a coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineEvaluation {
    pub product_id: String,

    /// Resolved unit price (caller price or catalog price).
    pub unit_price: Money,

    /// Quantity in the cart as given. 0 for bonus-only lines.
    pub quantity: i64,

    /// Free units granted by BxGy pairs.
    pub bonus_quantity: i64,

    /// Discount attributed to this line.
    pub discount: Money,
}

impl LineEvaluation {
    /// Line total before discount, excluding bonus units.
    #[inline]
    pub fn line_total(&self) -> CoreResult<Money> {
        line_total(self.unit_price, self.quantity)
    }

    /// Whether the line exists only because of a BxGy bonus.
    #[inline]
    pub fn is_bonus_only(&self) -> bool {
        self.quantity == 0
    }
}

/// Outcome of applying one coupon to one cart.
///
/// Lines come in cart order, followed by bonus-only lines in the order
/// their pairs were evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EvaluationResult {
    pub coupon_id: String,
    pub code: String,
    pub kind: CouponKind,
    pub lines: Vec<LineEvaluation>,
    /// Σ quantity × unit price over the cart as given.
    pub subtotal: Money,
    pub total_discount: Money,
    pub message: String,
}

impl EvaluationResult {
    /// `subtotal - total_discount`. Never clamped: a misconfigured coupon
    /// may produce a negative amount.
    #[inline]
    pub fn final_price(&self) -> Money {
        self.subtotal - self.total_discount
    }

    /// The evaluation of a product's line, if any.
    pub fn line_for(&self, product_id: &str) -> Option<&LineEvaluation> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }
}

/// A coupon that applies to a cart, with the discount it would give.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ApplicableCoupon {
    pub coupon_id: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    pub discount: Money,
}

/// Outcome message for a kind.
pub fn outcome_message(kind: CouponKind) -> &'static str {
    match kind {
        CouponKind::CartWide => "Cart-wise discount applied!",
        CouponKind::ProductWise => "Product-wise discount applied!",
        CouponKind::BuyXGetY => "Buy X Get Y discount applied!",
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Stateless evaluator over a borrowed catalog.
///
/// Holds no counters or caches, so evaluating the same coupon against the
/// same cart twice yields identical results, and one engine can be shared
/// across threads.
pub struct DiscountEngine<'a, C: CatalogLookup + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: CatalogLookup + ?Sized> DiscountEngine<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        DiscountEngine { catalog }
    }

    // -------------------------------------------------------------------------
    // Public Operations
    // -------------------------------------------------------------------------

    /// Whether `coupon` applies to `cart` on `today`.
    ///
    /// ## Rules
    /// - any kind: false unless active and not expired
    /// - cart_wise: no threshold, or subtotal ≥ threshold
    /// - product_wise: the cart has a line for the target product
    /// - bxgy: some pair's buy line holds at least `buy_quantity`
    ///
    /// The only error is a catalog miss while pricing a cart-wide subtotal.
    pub fn is_eligible(&self, coupon: &Coupon, cart: &Cart, today: NaiveDate) -> CoreResult<bool> {
        if !coupon.is_valid_on(today) {
            return Ok(false);
        }
        self.rule_matches(&coupon.rule, cart)
    }

    /// Applies `coupon` to `cart` on `today`.
    ///
    /// ## Errors
    /// Checked in this order:
    /// 1. [`CoreError::CouponExpiredOrInactive`]
    /// 2. [`CoreError::CouponNotApplicable`]
    /// 3. [`CoreError::ProductNotFound`] while resolving a price
    pub fn evaluate(
        &self,
        coupon: &Coupon,
        cart: &Cart,
        today: NaiveDate,
    ) -> CoreResult<EvaluationResult> {
        if !coupon.is_valid_on(today) {
            return Err(CoreError::CouponExpiredOrInactive {
                code: coupon.code.clone(),
            });
        }
        if !self.rule_matches(&coupon.rule, cart)? {
            return Err(CoreError::CouponNotApplicable {
                code: coupon.code.clone(),
            });
        }

        let (lines, subtotal, total_discount) = self.compute(&coupon.rule, cart)?;

        Ok(EvaluationResult {
            coupon_id: coupon.id.clone(),
            code: coupon.code.clone(),
            kind: coupon.kind(),
            lines,
            subtotal,
            total_discount,
            message: outcome_message(coupon.kind()).to_string(),
        })
    }

    /// Every coupon in `coupons` that applies to `cart`, with its discount.
    ///
    /// Input order is preserved and no coupon is singled out as the best.
    /// The cart is never modified.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyCart`] if the cart has no lines
    /// - [`CoreError::ProductNotFound`] if an eligible coupon needs a price
    ///   the catalog cannot supply
    pub fn applicable_coupons(
        &self,
        coupons: &[Coupon],
        cart: &Cart,
        today: NaiveDate,
    ) -> CoreResult<Vec<ApplicableCoupon>> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let mut applicable = Vec::new();
        for coupon in coupons {
            if !self.is_eligible(coupon, cart, today)? {
                continue;
            }
            let (_, _, discount) = self.compute(&coupon.rule, cart)?;
            applicable.push(ApplicableCoupon {
                coupon_id: coupon.id.clone(),
                code: coupon.code.clone(),
                kind: coupon.kind(),
                discount,
            });
        }
        Ok(applicable)
    }

    // -------------------------------------------------------------------------
    // Pricing Helpers
    // -------------------------------------------------------------------------

    /// Caller price if the line has one, catalog price otherwise.
    fn unit_price(&self, line: &CartLine) -> CoreResult<Money> {
        match line.unit_price {
            Some(price) => Ok(price),
            None => self.catalog_price(&line.product_id),
        }
    }

    fn catalog_price(&self, product_id: &str) -> CoreResult<Money> {
        Ok(self.catalog.get_product(product_id)?.price())
    }

    fn subtotal(&self, cart: &Cart) -> CoreResult<Money> {
        cart.lines()
            .iter()
            .try_fold(Money::zero(), |acc, line| -> CoreResult<Money> {
                let total = line_total(self.unit_price(line)?, line.quantity)?;
                checked_add(acc, total, "subtotal")
            })
    }

    // -------------------------------------------------------------------------
    // Per-Kind Rules
    // -------------------------------------------------------------------------

    fn rule_matches(&self, rule: &CouponRule, cart: &Cart) -> CoreResult<bool> {
        match rule {
            CouponRule::CartWide { threshold, .. } => match threshold {
                None => Ok(true),
                Some(threshold) => Ok(self.subtotal(cart)? >= *threshold),
            },
            CouponRule::ProductWise { product_id, .. } => Ok(cart.contains(product_id)),
            CouponRule::BuyXGetY { pairs } => Ok(pairs
                .iter()
                .any(|pair| pair.is_triggered_by(cart.quantity_of(&pair.buy_product_id)))),
        }
    }

    /// Priced lines, subtotal and total discount for an eligible rule.
    fn compute(
        &self,
        rule: &CouponRule,
        cart: &Cart,
    ) -> CoreResult<(Vec<LineEvaluation>, Money, Money)> {
        let mut lines = cart
            .lines()
            .iter()
            .map(|line| -> CoreResult<LineEvaluation> {
                Ok(LineEvaluation {
                    product_id: line.product_id.clone(),
                    unit_price: self.unit_price(line)?,
                    quantity: line.quantity,
                    bonus_quantity: 0,
                    discount: Money::zero(),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let subtotal = lines
            .iter()
            .try_fold(Money::zero(), |acc, line| -> CoreResult<Money> {
                checked_add(acc, line.line_total()?, "subtotal")
            })?;

        let total_discount = match rule {
            CouponRule::CartWide { discount, .. } => subtotal.percentage(*discount),
            CouponRule::ProductWise {
                product_id,
                discount,
            } => {
                apply_product_discount(&mut lines, product_id, *discount)?;
                total_discount(&lines)?
            }
            CouponRule::BuyXGetY { pairs } => {
                for pair in pairs {
                    self.apply_pair(&mut lines, pair, cart)?;
                }
                total_discount(&lines)?
            }
        };

        Ok((lines, subtotal, total_discount))
    }

    /// Grants one pair's free units to its get line.
    fn apply_pair(
        &self,
        lines: &mut Vec<LineEvaluation>,
        pair: &BxGyPair,
        cart: &Cart,
    ) -> CoreResult<()> {
        let free_units = pair
            .free_units(cart.quantity_of(&pair.buy_product_id))
            .ok_or_else(|| ValidationError::overflow("free units"))?;
        if free_units <= 0 {
            return Ok(());
        }

        let index = match lines
            .iter()
            .position(|l| l.product_id == pair.get_product_id)
        {
            Some(index) => index,
            None => {
                lines.push(LineEvaluation {
                    product_id: pair.get_product_id.clone(),
                    unit_price: self.catalog_price(&pair.get_product_id)?,
                    quantity: 0,
                    bonus_quantity: 0,
                    discount: Money::zero(),
                });
                lines.len() - 1
            }
        };

        let line = &mut lines[index];
        let free_value = line_total(line.unit_price, free_units)?;
        line.bonus_quantity = line
            .bonus_quantity
            .checked_add(free_units)
            .ok_or_else(|| ValidationError::overflow("free units"))?;
        line.discount = checked_add(line.discount, free_value, "discount")?;
        Ok(())
    }
}

fn apply_product_discount(
    lines: &mut [LineEvaluation],
    product_id: &str,
    rate: Percentage,
) -> CoreResult<()> {
    for line in lines.iter_mut().filter(|l| l.product_id == product_id) {
        line.discount = line.line_total()?.percentage(rate);
    }
    Ok(())
}

fn line_total(unit_price: Money, quantity: i64) -> CoreResult<Money> {
    unit_price
        .checked_mul_quantity(quantity)
        .ok_or_else(|| ValidationError::overflow("line total").into())
}

fn checked_add(a: Money, b: Money, field: &str) -> CoreResult<Money> {
    a.checked_add(b)
        .ok_or_else(|| ValidationError::overflow(field).into())
}

fn total_discount(lines: &[LineEvaluation]) -> CoreResult<Money> {
    Money::checked_sum(lines.iter().map(|l| l.discount))
        .ok_or_else(|| ValidationError::overflow("discount").into())
}

// =============================================================================
// Unit Tests
// =============================================================================
