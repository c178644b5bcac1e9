//! # Error Types
//!
//! Domain-specific error types for coupon-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  coupon-core errors (this file)                                        │
//! │  ├── CoreError        - Lookup, eligibility and evaluation failures    │
//! │  └── ValidationError  - Malformed coupon definitions or carts          │
//! │                                                                         │
//! │  coupon-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  coupon-service errors (app)                                           │
//! │  └── ServiceError     - What callers see (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Three Remediations
//! Callers must be able to tell apart "it does not exist", "it exists but
//! does not apply to this cart" and "the input is malformed". Every
//! [`CoreError`] reports which one it is through [`CoreError::category`].

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while resolving coupons and evaluating discounts.
///
/// The engine never partially applies a discount: whenever one of these is
/// returned, no evaluation result exists.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No coupon matches the given id or code.
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// The coupon exists but is switched off or past its expiry date.
    ///
    /// ## When This Occurs
    /// - `is_active` is false
    /// - the evaluation date is after `expiry_date`
    ///
    /// Reported before any eligibility check, so an expired coupon never
    /// surfaces as "not applicable".
    #[error("Coupon {code} is expired or inactive")]
    CouponExpiredOrInactive { code: String },

    /// The coupon is valid but its eligibility rule rejects the cart.
    ///
    /// ## User Workflow
    /// ```text
    /// Apply CART10 (threshold $100.00)
    ///      │
    ///      ▼
    /// Cart subtotal: $80.00
    ///      │
    ///      ▼
    /// CouponNotApplicable { code: "CART10" }
    ///      │
    ///      ▼
    /// Caller shows: "Add $20.00 more to use this coupon"
    /// ```
    #[error("Coupon {code} is not applicable to this cart")]
    CouponNotApplicable { code: String },

    /// A product referenced by the cart or a coupon is not in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Malformed coupon definition or cart.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(#[from] ValidationError),

    /// Listing applicable coupons requires at least one cart line.
    #[error("Cart has no items")]
    EmptyCart,
}

/// Which remediation an error calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The referenced coupon or product does not exist.
    NotFound,
    /// The coupon exists but cannot be used with this cart right now.
    Inapplicable,
    /// The request itself is malformed.
    InvalidInput,
}

impl CoreError {
    /// Classifies the error for the calling layer.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::CouponNotFound(_) | CoreError::ProductNotFound(_) => ErrorCategory::NotFound,
            CoreError::CouponExpiredOrInactive { .. } | CoreError::CouponNotApplicable { .. } => {
                ErrorCategory::Inapplicable
            }
            CoreError::InvalidParameters(_) | CoreError::EmptyCart => ErrorCategory::InvalidInput,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level validation failures.
///
/// Raised when a coupon definition or cart does not meet the rules of its
/// kind, before any discount logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., unexpected characters in an id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// An amount computed from otherwise valid inputs does not fit in i64.
    #[error("{field} is too large to compute")]
    Overflow { field: String },

    /// Duplicate value (e.g., the same product twice in a cart).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::Overflow`].
    pub fn overflow(field: impl Into<String>) -> Self {
        ValidationError::Overflow {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::MustBePositive`].
    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
