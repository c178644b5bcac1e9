//! # Service Error Type
//!
//! Unified error type for every `CouponService` operation.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError ─┐                                                     │
//! │  CoreError ───────┼──► ServiceError { code, message } ──► CLI / caller  │
//! │  DbError ─────────┘                                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! ```json
//! {
//!   "code": "COUPON_NOT_APPLICABLE",
//!   "message": "Coupon COUPON-1A2B3C4D is not applicable to this cart"
//! }
//! ```

use serde::Serialize;

use coupon_core::{CoreError, ValidationError};
use coupon_db::DbError;

/// Error returned by service operations.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for service responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Coupon or product not found (404)
    NotFound,

    /// Coupon is switched off or expired (422)
    CouponInactive,

    /// Coupon rule rejects the cart (422)
    CouponNotApplicable,

    /// Input validation failed (400)
    ValidationError,

    /// Listing applicable coupons for an empty cart (400)
    EmptyCart,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal error (500)
    Internal,
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Creates a new service error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ServiceError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to service errors.
impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ServiceError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ConnectionFailed(_) => {
                ServiceError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ServiceError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ServiceError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::PoolExhausted => {
                ServiceError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Corrupt { entity, id, reason } => {
                tracing::error!(%entity, %id, %reason, "Stored row cannot be read");
                ServiceError::new(ErrorCode::DatabaseError, "Stored data is inconsistent")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to service errors.
impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::CouponNotFound(id) => ServiceError::not_found("Coupon", &id),
            CoreError::ProductNotFound(id) => ServiceError::not_found("Product", &id),
            CoreError::CouponExpiredOrInactive { .. } => {
                ServiceError::new(ErrorCode::CouponInactive, message)
            }
            CoreError::CouponNotApplicable { .. } => {
                ServiceError::new(ErrorCode::CouponNotApplicable, message)
            }
            CoreError::InvalidParameters(e) => ServiceError::validation(e.to_string()),
            CoreError::EmptyCart => ServiceError::new(ErrorCode::EmptyCart, message),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::validation(err.to_string())
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_keep_categories_apart() {
        let cases = [
            (CoreError::CouponNotFound("c-1".into()), ErrorCode::NotFound),
            (CoreError::ProductNotFound("A".into()), ErrorCode::NotFound),
            (
                CoreError::CouponExpiredOrInactive { code: "X".into() },
                ErrorCode::CouponInactive,
            ),
            (
                CoreError::CouponNotApplicable { code: "X".into() },
                ErrorCode::CouponNotApplicable,
            ),
            (
                CoreError::InvalidParameters(ValidationError::required("discount")),
                ErrorCode::ValidationError,
            ),
            (CoreError::EmptyCart, ErrorCode::EmptyCart),
        ];

        for (err, code) in cases {
            assert_eq!(ServiceError::from(err).code, code);
        }
    }

    #[test]
    fn test_db_errors() {
        let err = ServiceError::from(DbError::not_found("Coupon", "c-9"));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Coupon not found: c-9");

        let err = ServiceError::from(DbError::duplicate("code", "SAVE10"));
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = ServiceError::from(DbError::corrupt("coupon", "c-1", "no pairs"));
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn test_serialization() {
        let err = ServiceError::from(CoreError::EmptyCart);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "EMPTY_CART");
        assert_eq!(json["message"], "Cart has no items");
    }
}
