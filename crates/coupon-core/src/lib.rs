//! # coupon-core: Pure Discount Logic
//!
//! This crate holds everything needed to decide whether a coupon applies to
//! a cart and what it is worth. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Coupon Workspace                                 │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 coupon-service (CLI + service)                  │   │
//! │  │   create / list / get / update / delete / applicable / apply   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ loads a snapshot                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ coupon-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │  types   │  │  money   │  │   cart   │  │  validation  │   │   │
//! │  │   │  Coupon  │  │  Money   │  │   Cart   │  │    rules     │   │   │
//! │  │   │ Product  │  │ rounding │  │ CartLine │  │              │   │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘   │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │  store   │─►│  engine  │─►│ pricing  │◄─│   checkout   │   │   │
//! │  │   │ lookups  │  │ discount │  │PricedCart│  │ orchestration│   │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO LOGGING • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  coupon-db (Database Layer)                     │   │
//! │  │          SQLite queries, migrations, repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Coupon, CouponRule, Product, Percentage)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - The cart a coupon is evaluated against
//! - [`error`] - Domain error types
//! - [`validation`] - Field and coupon-rule validation
//! - [`store`] - Catalog and coupon lookup contracts, in-memory stores
//! - [`engine`] - Eligibility and discount evaluation
//! - [`pricing`] - Folds an evaluation into a priced cart
//! - [`checkout`] - Resolves a coupon reference and prices the cart
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: same cart, coupon, catalog and date give the same result
//! 2. **No I/O**: storage is reached only through the [`store`] traits
//! 3. **Integer Money**: all amounts are cents (i64), rates are basis points
//! 4. **All or Nothing**: an evaluation either fully succeeds or returns an error
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use coupon_core::cart::{Cart, CartLine};
//! use coupon_core::engine::DiscountEngine;
//! use coupon_core::store::InMemoryCatalog;
//! use coupon_core::{Coupon, CouponRule, Money, Percentage};
//!
//! let catalog = InMemoryCatalog::new();
//! let engine = DiscountEngine::new(&catalog);
//!
//! let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
//! let coupon = Coupon {
//!     id: "c-1".into(),
//!     code: "COUPON-CART10".into(),
//!     is_active: true,
//!     expiry_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
//!     rule: CouponRule::CartWide {
//!         threshold: Some(Money::from_cents(10000)),
//!         discount: Percentage::from_percent(10),
//!     },
//!     created_at: chrono::Utc::now(),
//!     updated_at: chrono::Utc::now(),
//! };
//!
//! let cart = Cart::from_lines([CartLine::priced("A", 2, Money::from_cents(10000))]).unwrap();
//! let result = engine.evaluate(&coupon, &cart, today).unwrap();
//!
//! // $200.00 at 10% = $20.00 off
//! assert_eq!(result.total_discount.cents(), 2000);
//! assert_eq!(result.final_price().cents(), 18000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod engine;
pub mod error;
pub mod money;
pub mod pricing;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ErrorCategory, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single cart line
///
/// ## Business Reason
/// Catches typos (1000 instead of 10) before they turn into huge BxGy
/// bonuses.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum unit price or cart-wide threshold, in cents ($100,000,000.00).
///
/// With [`MAX_CART_LINES`] and [`MAX_ITEM_QUANTITY`] this keeps every
/// subtotal and BxGy discount of a valid cart and coupon well inside i64.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Largest page a coupon listing may request.
pub const MAX_PAGE_SIZE: u32 = 100;
