//! Request and response shapes of the service.
//!
//! ## Coupon Request
//! ```json
//! {
//!   "type": "bxgy",
//!   "details": {
//!     "buy_products": [{ "product_id": "A", "quantity": 2 }],
//!     "get_products": [{ "product_id": "B", "quantity": 1 }],
//!     "repetition_limit": 3
//!   },
//!   "is_active": true,
//!   "expiry_date": "2026-12-31"
//! }
//! ```
//! `threshold` is in major units (`100.0` = $100.00) and `discount` is a
//! percent (`12.5` = 12.5%). camelCase field names are accepted too.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use coupon_core::engine::ApplicableCoupon;
use coupon_core::validation::{
    validate_coupon_rule, validate_price_cents, validate_product_id, validate_product_name,
    ValidationResult,
};
use coupon_core::{
    BxGyPair, CouponKind, CouponRule, Money, Percentage, ValidationError, MAX_PRICE_CENTS,
};

// =============================================================================
// Coupon Requests
// =============================================================================

/// Body of a create or update coupon request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponRequest {
    #[serde(rename = "type")]
    pub kind: CouponKind,

    #[serde(default)]
    pub details: CouponDetails,

    /// Defaults to true on create; unchanged on update.
    #[serde(default, alias = "isActive")]
    pub is_active: Option<bool>,

    /// Defaults to today plus the configured validity on create; unchanged
    /// on update.
    #[serde(default, alias = "expiryDate")]
    pub expiry_date: Option<NaiveDate>,
}

pub type CreateCouponRequest = CouponRequest;
pub type UpdateCouponRequest = CouponRequest;

/// Kind-specific parameters. Which fields are required depends on the kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouponDetails {
    #[serde(default)]
    pub threshold: Option<f64>,

    #[serde(default)]
    pub discount: Option<f64>,

    #[serde(default, alias = "productId")]
    pub product_id: Option<String>,

    #[serde(default, alias = "buyProducts")]
    pub buy_products: Vec<ProductQuantity>,

    #[serde(default, alias = "getProducts")]
    pub get_products: Vec<ProductQuantity>,

    #[serde(default, alias = "repetitionLimit")]
    pub repetition_limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuantity {
    #[serde(alias = "productId")]
    pub product_id: String,
    pub quantity: i64,
}

impl CouponRequest {
    /// Builds and validates the rule this request describes.
    pub fn rule(&self) -> ValidationResult<CouponRule> {
        let rule = self.details.to_rule(self.kind)?;
        validate_coupon_rule(&rule)?;
        Ok(rule)
    }
}

impl CouponDetails {
    /// Maps the loose request fields onto a rule of `kind`.
    ///
    /// BxGy pairs are every buy product combined with every get product,
    /// in request order, all sharing `repetition_limit`.
    pub fn to_rule(&self, kind: CouponKind) -> ValidationResult<CouponRule> {
        match kind {
            CouponKind::CartWide => Ok(CouponRule::CartWide {
                threshold: self.threshold.map(major_to_money).transpose()?,
                discount: self.discount()?,
            }),
            CouponKind::ProductWise => Ok(CouponRule::ProductWise {
                product_id: self
                    .product_id
                    .clone()
                    .filter(|id| !id.trim().is_empty())
                    .ok_or_else(|| ValidationError::required("product_id"))?,
                discount: self.discount()?,
            }),
            CouponKind::BuyXGetY => {
                if self.buy_products.is_empty() {
                    return Err(ValidationError::required("buy_products"));
                }
                if self.get_products.is_empty() {
                    return Err(ValidationError::required("get_products"));
                }

                let pairs = self
                    .buy_products
                    .iter()
                    .flat_map(|buy| {
                        self.get_products.iter().map(move |get| BxGyPair {
                            buy_product_id: buy.product_id.clone(),
                            buy_quantity: buy.quantity,
                            get_product_id: get.product_id.clone(),
                            get_quantity: get.quantity,
                            repetition_limit: self.repetition_limit,
                        })
                    })
                    .collect();

                Ok(CouponRule::BuyXGetY { pairs })
            }
        }
    }

    fn discount(&self) -> ValidationResult<Percentage> {
        let percent = self
            .discount
            .ok_or_else(|| ValidationError::required("discount"))?;
        if !(0.0..=100.0).contains(&percent) {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(Percentage::from_percentage(percent))
    }
}

/// `100.5` → $100.50, rounded to the nearest cent.
///
/// Amounts outside 0..=MAX_PRICE_CENTS are rejected before the cast, which
/// would otherwise saturate.
fn major_to_money(amount: f64) -> ValidationResult<Money> {
    if !amount.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "threshold".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    let cents = (amount * 100.0).round();
    if !(0.0..=MAX_PRICE_CENTS as f64).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "threshold".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(Money::from_cents(cents as i64))
}

// =============================================================================
// Listing
// =============================================================================

/// Optional listing parameters; unset values fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCouponsQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

/// Response of the applicable coupons listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicableCouponsResponse {
    pub applicable_coupons: Vec<ApplicableCoupon>,
}

// =============================================================================
// Products
// =============================================================================

/// Body of a create product request. A missing id is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub price_cents: i64,
}

impl CreateProductRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(id) = &self.id {
            validate_product_id(id)?;
        }
        validate_product_name(&self.name)?;
        validate_price_cents(self.price_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> CouponRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_cart_wise_request() {
        let req = request(
            r#"{"type": "cart_wise", "details": {"threshold": 100.0, "discount": 10}}"#,
        );
        assert_eq!(
            req.rule().unwrap(),
            CouponRule::CartWide {
                threshold: Some(Money::from_cents(10000)),
                discount: Percentage::from_percent(10),
            }
        );
        assert_eq!(req.is_active, None);
    }

    #[test]
    fn test_camel_case_aliases() {
        let req = request(
            r#"{"type": "product_wise", "details": {"productId": "A", "discount": 12.5},
                "isActive": false, "expiryDate": "2026-12-31"}"#,
        );
        assert_eq!(
            req.rule().unwrap(),
            CouponRule::ProductWise {
                product_id: "A".to_string(),
                discount: Percentage::from_bps(1250),
            }
        );
        assert_eq!(req.is_active, Some(false));
        assert_eq!(req.expiry_date, NaiveDate::from_ymd_opt(2026, 12, 31));
    }

    #[test]
    fn test_bxgy_pairs_are_cross_product() {
        let req = request(
            r#"{"type": "bxgy", "details": {
                "buy_products": [{"product_id": "X", "quantity": 3}, {"product_id": "Y", "quantity": 2}],
                "get_products": [{"product_id": "Z", "quantity": 1}],
                "repetition_limit": 2}}"#,
        );
        let rule = req.rule().unwrap();
        let CouponRule::BuyXGetY { pairs } = rule else {
            panic!("expected bxgy rule");
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].buy_product_id, "X");
        assert_eq!(pairs[0].buy_quantity, 3);
        assert_eq!(pairs[1].buy_product_id, "Y");
        assert!(pairs
            .iter()
            .all(|p| p.get_product_id == "Z" && p.repetition_limit == Some(2)));
    }

    #[test]
    fn test_missing_kind_fields() {
        let missing_discount = request(r#"{"type": "cart_wise", "details": {"threshold": 5}}"#);
        assert!(matches!(
            missing_discount.rule(),
            Err(ValidationError::Required { field }) if field == "discount"
        ));

        let missing_product = request(r#"{"type": "product_wise", "details": {"discount": 5}}"#);
        assert!(matches!(
            missing_product.rule(),
            Err(ValidationError::Required { field }) if field == "product_id"
        ));

        let missing_get = request(
            r#"{"type": "bxgy", "details": {"buy_products": [{"product_id": "X", "quantity": 1}]}}"#,
        );
        assert!(matches!(
            missing_get.rule(),
            Err(ValidationError::Required { field }) if field == "get_products"
        ));

        let no_details = request(r#"{"type": "bxgy"}"#);
        assert!(no_details.rule().is_err());
    }

    #[test]
    fn test_out_of_range_values() {
        let too_much = request(r#"{"type": "cart_wise", "details": {"discount": 150}}"#);
        assert!(matches!(too_much.rule(), Err(ValidationError::OutOfRange { .. })));

        let negative_threshold =
            request(r#"{"type": "cart_wise", "details": {"threshold": -1, "discount": 5}}"#);
        assert!(negative_threshold.rule().is_err());

        let huge_threshold =
            request(r#"{"type": "cart_wise", "details": {"threshold": 1e300, "discount": 5}}"#);
        assert!(matches!(
            huge_threshold.rule(),
            Err(ValidationError::OutOfRange { field, .. }) if field == "threshold"
        ));

        let max_threshold = request(
            r#"{"type": "cart_wise", "details": {"threshold": 100000000.0, "discount": 5}}"#,
        );
        assert!(max_threshold.rule().is_ok());

        let huge_get = request(
            r#"{"type": "bxgy", "details": {
                "buy_products": [{"product_id": "X", "quantity": 1}],
                "get_products": [{"product_id": "Z", "quantity": 4611686018427387903}]}}"#,
        );
        assert!(matches!(huge_get.rule(), Err(ValidationError::OutOfRange { .. })));

        let zero_buy = request(
            r#"{"type": "bxgy", "details": {
                "buy_products": [{"product_id": "X", "quantity": 0}],
                "get_products": [{"product_id": "Z", "quantity": 1}]}}"#,
        );
        assert!(matches!(zero_buy.rule(), Err(ValidationError::MustBePositive { .. })));
    }

    #[test]
    fn test_product_request_validation() {
        let ok = CreateProductRequest {
            id: Some("SKU-1".to_string()),
            name: "Mug".to_string(),
            price_cents: 1200,
        };
        assert!(ok.validate().is_ok());

        let bad = CreateProductRequest {
            price_cents: -1,
            ..ok
        };
        assert!(bad.validate().is_err());
    }
}
