//! # Checkout
//!
//! Resolves a coupon reference, runs the engine and prices the cart.
//!
//! ## Apply Flow
//! ```text
//! CouponRef ──► CouponStore ──► Coupon
//!                                  │
//!                 Cart ───────────►├──► DiscountEngine::evaluate ──► EvaluationResult
//!                                  │                                       │
//!                                  └────────► PricedCart::assemble ◄───────┘
//! ```

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::engine::{ApplicableCoupon, DiscountEngine};
use crate::error::{CoreError, CoreResult};
use crate::pricing::PricedCart;
use crate::store::{CatalogLookup, CouponStore};
use crate::types::Coupon;

/// How a caller names the coupon to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum CouponRef {
    Id(String),
    Code(String),
    /// Tries the value as an id, then as a code.
    Any(String),
}

impl CouponRef {
    /// Looks the coupon up in `store`.
    pub fn resolve<S: CouponStore + ?Sized>(&self, store: &S) -> CoreResult<Coupon> {
        match self {
            CouponRef::Id(id) => store.get_by_id(id),
            CouponRef::Code(code) => store.get_by_code(code),
            CouponRef::Any(value) => match store.get_by_id(value) {
                Err(CoreError::CouponNotFound(_)) => store.get_by_code(value),
                found => found,
            },
        }
    }
}

impl fmt::Display for CouponRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouponRef::Id(id) => write!(f, "id {id}"),
            CouponRef::Code(code) => write!(f, "code {code}"),
            CouponRef::Any(value) => f.write_str(value),
        }
    }
}

/// Applies the referenced coupon to `cart` and returns the priced cart.
///
/// ## Errors
/// - [`CoreError::CouponNotFound`] if the reference does not resolve
/// - anything [`DiscountEngine::evaluate`] returns
pub fn apply_coupon<S, C>(
    store: &S,
    catalog: &C,
    reference: &CouponRef,
    cart: &Cart,
    today: NaiveDate,
) -> CoreResult<PricedCart>
where
    S: CouponStore + ?Sized,
    C: CatalogLookup + ?Sized,
{
    let coupon = reference.resolve(store)?;
    let evaluation = DiscountEngine::new(catalog).evaluate(&coupon, cart, today)?;
    Ok(PricedCart::assemble(cart, &evaluation))
}

/// Every stored coupon that applies to `cart`, in store order.
///
/// An empty cart is rejected by the engine with [`CoreError::EmptyCart`].
pub fn list_applicable_coupons<S, C>(
    store: &S,
    catalog: &C,
    cart: &Cart,
    today: NaiveDate,
) -> CoreResult<Vec<ApplicableCoupon>>
where
    S: CouponStore + ?Sized,
    C: CatalogLookup + ?Sized,
{
    let coupons = store.list_all()?;
    DiscountEngine::new(catalog).applicable_coupons(&coupons, cart, today)
}
