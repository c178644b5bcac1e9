//! # Domain Types
//!
//! Core domain types shared by the engine, the database layer and the
//! service.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────────────────────────┐    │
//! │  │    Product      │   │                 Coupon                   │    │
//! │  │  ─────────────  │   │  ──────────────────────────────────────  │    │
//! │  │  id             │   │  id, code, is_active, expiry_date        │    │
//! │  │  name           │   │  rule: CouponRule                        │    │
//! │  │  price_cents    │   │    ├── CartWide    { threshold, discount }│   │
//! │  └─────────────────┘   │    ├── ProductWise { product_id, discount}│   │
//! │                        │    └── BuyXGetY    { pairs: [BxGyPair] } │    │
//! │  ┌─────────────────┐   └──────────────────────────────────────────┘    │
//! │  │   Percentage    │                                                    │
//! │  │  bps (u32)      │   ┌─────────────────┐                              │
//! │  │  1000 = 10%     │   │   CouponKind    │  field-less tag of the rule  │
//! │  └─────────────────┘   │  cart_wise      │                              │
//! │                        │  product_wise   │                              │
//! │                        │  bxgy           │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A coupon carries exactly the parameters of its kind: the rule is a
//! tagged union, so a product-wise coupon cannot have a threshold and a
//! cart-wide coupon cannot have pairs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Percentage
// =============================================================================

/// A discount rate in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10% and 10000 bps = 100%.
/// Whole-number math keeps every discount reproducible to the cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// 100% in basis points.
    pub const FULL_BPS: u32 = 10_000;

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a rate from a whole percent (`10` → 10%).
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        Percentage(percent * 100)
    }

    /// Creates a rate from a fractional percent (`12.5` → 1250 bps).
    ///
    /// Negative input saturates to zero; range checks belong to validation.
    pub fn from_percentage(pct: f64) -> Self {
        Percentage((pct * 100.0).round().max(0.0) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    #[inline]
    pub const fn full() -> Self {
        Percentage(Self::FULL_BPS)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product. Reference data: the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Catalog identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Unit price in cents.
    pub price_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product stamped with the current time.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        let now = Utc::now();
        Product {
            id: id.into(),
            name: name.into(),
            price_cents: price.cents(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Coupon Kind
// =============================================================================

/// The kind of a coupon, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum CouponKind {
    /// Percentage off the whole cart, optionally above a threshold.
    #[serde(rename = "cart_wise")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cart_wise"))]
    CartWide,
    /// Percentage off the lines of one product.
    #[serde(rename = "product_wise")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "product_wise"))]
    ProductWise,
    /// Free units of a product for every multiple bought of another.
    #[serde(rename = "bxgy")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bxgy"))]
    BuyXGetY,
}

impl CouponKind {
    /// Wire name of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CouponKind::CartWide => "cart_wise",
            CouponKind::ProductWise => "product_wise",
            CouponKind::BuyXGetY => "bxgy",
        }
    }
}

impl fmt::Display for CouponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// BxGy Pair
// =============================================================================

/// One "buy X get Y" rule of a BxGy coupon.
///
/// ## Repetition Math
/// ```text
/// buy 2 of A, get 1 of B, limit 3
///
///   A in cart: 5   → floor(5 / 2) = 2 repetitions → 2 free B
///   A in cart: 10  → floor(10 / 2) = 5 → capped at 3 → 3 free B
///   A in cart: 1   → 0 repetitions → nothing
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BxGyPair {
    pub buy_product_id: String,
    pub buy_quantity: i64,
    pub get_product_id: String,
    pub get_quantity: i64,
    /// Maximum repetitions per evaluation. `None` = unbounded.
    pub repetition_limit: Option<i64>,
}

impl BxGyPair {
    /// How many times the pair triggers for a buy-line quantity.
    ///
    /// Integer floor division; the remainder is ignored. A non-positive
    /// `buy_quantity` never triggers.
    pub fn repetitions(&self, buy_line_quantity: i64) -> i64 {
        if self.buy_quantity <= 0 || buy_line_quantity <= 0 {
            return 0;
        }
        let repetitions = buy_line_quantity / self.buy_quantity;
        match self.repetition_limit {
            Some(limit) => repetitions.min(limit.max(0)),
            None => repetitions,
        }
    }

    /// Free units of the get product earned by a buy-line quantity, or
    /// `None` if `repetitions × get_quantity` overflows.
    #[inline]
    pub fn free_units(&self, buy_line_quantity: i64) -> Option<i64> {
        self.repetitions(buy_line_quantity)
            .checked_mul(self.get_quantity)
    }

    /// Whether the buy-line quantity reaches at least one repetition's worth.
    #[inline]
    pub fn is_triggered_by(&self, buy_line_quantity: i64) -> bool {
        self.buy_quantity > 0 && buy_line_quantity >= self.buy_quantity
    }
}

// =============================================================================
// Coupon Rule
// =============================================================================

/// Kind-specific parameters of a coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
#[ts(export)]
pub enum CouponRule {
    #[serde(rename = "cart_wise")]
    CartWide {
        /// Minimum subtotal. `None` = no minimum.
        threshold: Option<Money>,
        discount: Percentage,
    },
    #[serde(rename = "product_wise")]
    ProductWise {
        product_id: String,
        discount: Percentage,
    },
    #[serde(rename = "bxgy")]
    BuyXGetY {
        /// Evaluated in this order.
        pairs: Vec<BxGyPair>,
    },
}

impl CouponRule {
    /// The field-less tag of this rule.
    pub fn kind(&self) -> CouponKind {
        match self {
            CouponRule::CartWide { .. } => CouponKind::CartWide,
            CouponRule::ProductWise { .. } => CouponKind::ProductWise,
            CouponRule::BuyXGetY { .. } => CouponKind::BuyXGetY,
        }
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A promotional coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coupon {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Unique, human-facing code (`COUPON-1A2B3C4D`).
    pub code: String,

    /// Switched-off coupons never apply.
    pub is_active: bool,

    /// Last day on which the coupon is valid.
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,

    pub rule: CouponRule,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    #[inline]
    pub fn kind(&self) -> CouponKind {
        self.rule.kind()
    }

    /// Active and not expired as of `today`. The expiry day itself is valid.
    pub fn is_valid_on(&self, today: NaiveDate) -> bool {
        self.is_active && self.expiry_date >= today
    }

    /// BxGy pairs in configured order; empty for other kinds.
    pub fn bxgy_pairs(&self) -> &[BxGyPair] {
        match &self.rule {
            CouponRule::BuyXGetY { pairs } => pairs,
            _ => &[],
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(buy: i64, get: i64, limit: Option<i64>) -> BxGyPair {
        BxGyPair {
            buy_product_id: "A".to_string(),
            buy_quantity: buy,
            get_product_id: "B".to_string(),
            get_quantity: get,
            repetition_limit: limit,
        }
    }

    fn coupon(is_active: bool, expiry: NaiveDate) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: "c-1".to_string(),
            code: "COUPON-TEST0001".to_string(),
            is_active,
            expiry_date: expiry,
            rule: CouponRule::CartWide {
                threshold: None,
                discount: Percentage::from_percent(10),
            },
            created_at: now,
            updated_at: now,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_percentage_constructors() {
        assert_eq!(Percentage::from_percent(10).bps(), 1000);
        assert_eq!(Percentage::from_percentage(12.5).bps(), 1250);
        assert_eq!(Percentage::from_percentage(-3.0).bps(), 0);
        assert!((Percentage::from_bps(825).percentage() - 8.25).abs() < 0.001);
        assert_eq!(Percentage::full().bps(), 10_000);
        assert_eq!(Percentage::from_bps(1250).to_string(), "12.5%");
    }

    #[test]
    fn test_repetitions_floor_division() {
        let p = pair(2, 1, None);
        assert_eq!(p.repetitions(5), 2);
        assert_eq!(p.free_units(5), Some(2));
        assert_eq!(p.repetitions(1), 0);
        assert_eq!(p.repetitions(0), 0);
    }

    #[test]
    fn test_repetitions_capped_by_limit() {
        let p = pair(2, 1, Some(1));
        assert_eq!(p.repetitions(10), 1);
        assert_eq!(p.free_units(10), Some(1));

        let p = pair(2, 3, Some(2));
        assert_eq!(p.free_units(10), Some(6));
    }

    #[test]
    fn test_free_units_overflow() {
        let p = pair(1, i64::MAX / 2, None);
        assert_eq!(p.free_units(1), Some(i64::MAX / 2));
        assert_eq!(p.free_units(3), None);
    }

    #[test]
    fn test_pair_trigger() {
        let p = pair(3, 1, None);
        assert!(!p.is_triggered_by(2));
        assert!(p.is_triggered_by(3));
        assert!(!pair(0, 1, None).is_triggered_by(10));
    }

    #[test]
    fn test_coupon_validity_window() {
        let expiry = date(2026, 6, 30);
        assert!(coupon(true, expiry).is_valid_on(date(2026, 6, 29)));
        assert!(coupon(true, expiry).is_valid_on(expiry));
        assert!(!coupon(true, expiry).is_valid_on(date(2026, 7, 1)));
        assert!(!coupon(false, expiry).is_valid_on(date(2026, 1, 1)));
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(CouponKind::CartWide.to_string(), "cart_wise");
        assert_eq!(
            serde_json::to_string(&CouponKind::BuyXGetY).unwrap(),
            "\"bxgy\""
        );
    }

    #[test]
    fn test_rule_is_tagged_by_kind() {
        let rule = CouponRule::ProductWise {
            product_id: "A".to_string(),
            discount: Percentage::from_percent(20),
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "product_wise");
        assert_eq!(json["discount"], 2000);
        assert_eq!(rule.kind(), CouponKind::ProductWise);
    }

    #[test]
    fn test_bxgy_pairs_empty_for_other_kinds() {
        let c = coupon(true, date(2030, 1, 1));
        assert!(c.bxgy_pairs().is_empty());
        assert_eq!(c.kind(), CouponKind::CartWide);
    }
}
