//! # Validation Module
//!
//! Input validation for coupon definitions, products and carts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  └── Shapes and types                                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field rules (ids, quantities, prices, percentages)                │
//! │  └── Kind rules (a product-wise coupon needs a product, ...)           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE coupon codes                                               │
//! │  └── CHECK constraints per coupon kind                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use coupon_core::validation::{validate_product_id, validate_quantity};
//!
//! validate_product_id("SKU-42").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{BxGyPair, CouponRule, Percentage};
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_PAGE_SIZE, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product identifier.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use coupon_core::validation::validate_product_id;
///
/// assert!(validate_product_id("COKE-330").is_ok());
/// assert!(validate_product_id("").is_err());
/// assert!(validate_product_id("has space").is_err());
/// ```
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    validate_identifier("product_id", id, 64)
}

/// Validates a coupon code.
///
/// Same character rules as product ids, up to 32 characters.
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    validate_identifier("code", code, 32)
}

fn validate_identifier(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents: 0 (free items) up to MAX_PRICE_CENTS.
///
/// ```rust
/// use coupon_core::validation::validate_price_cents;
/// use coupon_core::MAX_PRICE_CENTS;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    validate_amount_cents("price", cents)
}

/// Shared bound for prices and thresholds.
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// A BxGy quantity: positive and at most MAX_ITEM_QUANTITY.
fn validate_pair_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive(field));
    }
    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a discount rate: 0% to 100%.
pub fn validate_discount(rate: Percentage) -> ValidationResult<()> {
    if rate.bps() > Percentage::FULL_BPS {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a page size for coupon listings.
pub fn validate_page_size(size: u32) -> ValidationResult<()> {
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "size".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more line fits in a cart holding `current_lines`.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Coupon Rule Validators
// =============================================================================

/// Validates the kind-specific parameters of a coupon.
///
/// ## Rules per Kind
/// ```text
/// cart_wise     0 ≤ threshold ≤ MAX_PRICE_CENTS when set, 0% ≤ discount ≤ 100%
/// product_wise  valid product id, 0% ≤ discount ≤ 100%
/// bxgy          at least one pair; every pair has valid product ids,
///               1 ≤ buy/get quantity ≤ MAX_ITEM_QUANTITY and, when set,
///               1 ≤ repetition limit ≤ MAX_ITEM_QUANTITY
/// ```
pub fn validate_coupon_rule(rule: &CouponRule) -> ValidationResult<()> {
    match rule {
        CouponRule::CartWide {
            threshold,
            discount,
        } => {
            if let Some(threshold) = threshold {
                validate_amount_cents("threshold", threshold.cents())?;
            }
            validate_discount(*discount)
        }
        CouponRule::ProductWise {
            product_id,
            discount,
        } => {
            validate_product_id(product_id)?;
            validate_discount(*discount)
        }
        CouponRule::BuyXGetY { pairs } => {
            if pairs.is_empty() {
                return Err(ValidationError::required("pairs"));
            }
            pairs.iter().try_for_each(validate_bxgy_pair)
        }
    }
}

/// Validates a single BxGy pair.
pub fn validate_bxgy_pair(pair: &BxGyPair) -> ValidationResult<()> {
    validate_product_id(&pair.buy_product_id)?;
    validate_product_id(&pair.get_product_id)?;

    validate_pair_quantity("buy_quantity", pair.buy_quantity)?;
    validate_pair_quantity("get_quantity", pair.get_quantity)?;
    if let Some(limit) = pair.repetition_limit {
        validate_pair_quantity("repetition_limit", limit)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
