//! # Coupon Service
//!
//! Every external operation: coupon administration, applicable-coupon
//! listing and coupon application.
//!
//! ## Apply Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  apply_coupon(reference, cart)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Snapshot::for_reference ← one coupon + the products it and the cart   │
//! │       │                    name, read from SQLite                       │
//! │       ▼                                                                 │
//! │  checkout::apply_coupon  ← pure, synchronous, evaluation date injected │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PricedCart { items, total_price, total_discount, final_price }        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Nothing is written while a cart is priced.

use chrono::{Months, NaiveDate, Utc};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::dto::{
    CreateCouponRequest, CreateProductRequest, ListCouponsQuery, UpdateCouponRequest,
};
use crate::error::{ServiceError, ServiceResult};
use coupon_core::checkout::{self, CouponRef};
use coupon_core::engine::ApplicableCoupon;
use coupon_core::pricing::PricedCart;
use coupon_core::{Cart, CoreError, Coupon, Money, Product, ValidationError};
use coupon_db::repository::coupon::{generate_coupon_code, generate_coupon_id};
use coupon_db::repository::product::generate_product_id;
use coupon_db::{Database, DbConfig, Page, PageRequest, Snapshot, SortDirection, SortField};

/// Coupon service over a database handle.
///
/// Cloning is cheap: clones share the pool.
#[derive(Debug, Clone)]
pub struct CouponService {
    db: Database,
    config: ServiceConfig,
}

impl CouponService {
    /// Opens the configured database and builds the service.
    pub async fn connect(config: ServiceConfig) -> ServiceResult<Self> {
        let db_config = DbConfig::new(&config.db_path).max_connections(config.db_max_connections);
        let db = Database::new(db_config).await?;
        Ok(CouponService::new(db, config))
    }

    pub fn new(db: Database, config: ServiceConfig) -> Self {
        CouponService { db, config }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Date coupons are evaluated against.
    pub fn today(&self) -> NaiveDate {
        self.config.today()
    }

    // =========================================================================
    // Coupon Administration
    // =========================================================================

    /// Creates a coupon with a generated id and code.
    ///
    /// ## Defaults
    /// - `is_active`: true
    /// - `expiry_date`: evaluation date + configured validity months
    pub async fn create_coupon(&self, request: CreateCouponRequest) -> ServiceResult<Coupon> {
        let rule = request.rule()?;
        let expiry_date = match request.expiry_date {
            Some(date) => date,
            None => self.default_expiry()?,
        };

        let now = Utc::now();
        let coupon = Coupon {
            id: generate_coupon_id(),
            code: generate_coupon_code(),
            is_active: request.is_active.unwrap_or(true),
            expiry_date,
            rule,
            created_at: now,
            updated_at: now,
        };

        let created = self.db.coupons().insert(&coupon).await?;
        info!(
            id = %created.id,
            code = %created.code,
            kind = %created.kind(),
            expiry = %created.expiry_date,
            "Coupon created"
        );
        Ok(created)
    }

    /// Lists one page of coupons.
    pub async fn list_coupons(&self, query: &ListCouponsQuery) -> ServiceResult<Page<Coupon>> {
        let sort = match &query.sort {
            Some(raw) => raw.parse::<SortField>()?,
            None => SortField::default(),
        };
        let direction = match &query.direction {
            Some(raw) => raw.parse::<SortDirection>()?,
            None => SortDirection::default(),
        };
        let request = PageRequest::new(
            query.page.unwrap_or(0),
            query.size.unwrap_or(self.config.default_page_size),
            sort,
            direction,
        )?;

        let page = self.db.coupons().list_page(&request).await?;
        debug!(
            page = page.page,
            returned = page.content.len(),
            total = page.total_elements,
            "Listed coupons"
        );
        Ok(page)
    }

    /// Gets a coupon by id.
    pub async fn get_coupon(&self, id: &str) -> ServiceResult<Coupon> {
        self.db
            .coupons()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CouponNotFound(id.to_string()).into())
    }

    /// Replaces a coupon's rule (and pairs), and optionally its active flag
    /// and expiry date. The code never changes.
    pub async fn update_coupon(
        &self,
        id: &str,
        request: UpdateCouponRequest,
    ) -> ServiceResult<Coupon> {
        let mut coupon = self.get_coupon(id).await?;

        coupon.rule = request.rule()?;
        if let Some(is_active) = request.is_active {
            coupon.is_active = is_active;
        }
        if let Some(expiry_date) = request.expiry_date {
            coupon.expiry_date = expiry_date;
        }

        self.db.coupons().update(&coupon).await?;
        info!(id = %id, kind = %coupon.kind(), "Coupon updated");

        self.get_coupon(id).await
    }

    /// Deletes a coupon and its pairs.
    pub async fn delete_coupon(&self, id: &str) -> ServiceResult<()> {
        self.db.coupons().delete(id).await?;
        info!(id = %id, "Coupon deleted");
        Ok(())
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Every stored coupon that applies to `cart`, with its discount.
    pub async fn list_applicable_coupons(&self, cart: &Cart) -> ServiceResult<Vec<ApplicableCoupon>> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let start = Instant::now();
        let snapshot = Snapshot::for_all(&self.db, cart).await?;
        let applicable =
            checkout::list_applicable_coupons(&snapshot.coupons, &snapshot.catalog, cart, self.today())?;

        debug!(
            lines = cart.len(),
            applicable = applicable.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Listed applicable coupons"
        );
        Ok(applicable)
    }

    /// Applies one coupon to `cart`.
    pub async fn apply_coupon(&self, reference: &CouponRef, cart: &Cart) -> ServiceResult<PricedCart> {
        let start = Instant::now();
        let snapshot = Snapshot::for_reference(&self.db, reference, cart).await?;

        let priced = checkout::apply_coupon(
            &snapshot.coupons,
            &snapshot.catalog,
            reference,
            cart,
            self.today(),
        )
        .map_err(|err| {
            warn!(coupon = %reference, error = %err, "Coupon not applied");
            ServiceError::from(err)
        })?;

        info!(
            coupon = %reference,
            total = %priced.total_price,
            discount = %priced.total_discount,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Coupon applied"
        );
        Ok(priced)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Adds a product to the catalog.
    pub async fn create_product(&self, request: CreateProductRequest) -> ServiceResult<Product> {
        request.validate()?;

        let id = request.id.unwrap_or_else(generate_product_id);
        let product = Product::new(id, request.name.trim(), Money::from_cents(request.price_cents));

        let created = self.db.products().insert(&product).await?;
        info!(id = %created.id, price = %created.price(), "Product created");
        Ok(created)
    }

    /// Gets a catalog product by id.
    pub async fn get_product(&self, id: &str) -> ServiceResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    fn default_expiry(&self) -> ServiceResult<NaiveDate> {
        self.today()
            .checked_add_months(Months::new(self.config.default_validity_months))
            .ok_or_else(|| {
                ValidationError::InvalidFormat {
                    field: "expiry_date".to_string(),
                    reason: "default validity overflows the calendar".to_string(),
                }
                .into()
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::CouponRequest;
    use crate::error::ErrorCode;
    use coupon_core::{CartLine, CouponKind, CouponRule};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    async fn service() -> CouponService {
        let config = ServiceConfig {
            db_path: ":memory:".to_string(),
            evaluation_date: Some(today()),
            ..ServiceConfig::default()
        };
        let service = CouponService::connect(config).await.unwrap();

        for (id, name, cents) in [("A", "Alpha", 5000), ("B", "Bravo", 2500), ("C", "Charlie", 1000)] {
            service
                .create_product(CreateProductRequest {
                    id: Some(id.to_string()),
                    name: name.to_string(),
                    price_cents: cents,
                })
                .await
                .unwrap();
        }
        service
    }

    fn request(json: &str) -> CouponRequest {
        serde_json::from_str(json).unwrap()
    }

    fn cart(lines: &[(&str, i64)]) -> Cart {
        Cart::from_lines(lines.iter().map(|(id, qty)| CartLine::new(*id, *qty))).unwrap()
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let service = service().await;
        let coupon = service
            .create_coupon(request(r#"{"type": "cart_wise", "details": {"discount": 10}}"#))
            .await
            .unwrap();

        assert!(coupon.is_active);
        assert_eq!(coupon.expiry_date, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        assert!(coupon.code.starts_with("COUPON-"));
        assert_eq!(service.get_coupon(&coupon.id).await.unwrap(), coupon);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let service = service().await;
        let err = service
            .create_coupon(request(r#"{"type": "product_wise", "details": {"discount": 10}}"#))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(service.database().coupons().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_amounts_that_could_overflow() {
        let service = service().await;
        let err = service
            .create_coupon(request(
                r#"{"type": "bxgy", "details": {
                    "buy_products": [{"product_id": "A", "quantity": 1}],
                    "get_products": [{"product_id": "B", "quantity": 4611686018427387903}]}}"#,
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(service.database().coupons().count().await.unwrap(), 0);

        let err = service
            .create_product(CreateProductRequest {
                id: Some("HUGE".to_string()),
                name: "Huge".to_string(),
                price_cents: 5_000_000_000_000_000_000,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_cart_wise_end_to_end() {
        let service = service().await;
        let coupon = service
            .create_coupon(request(
                r#"{"type": "cart_wise", "details": {"threshold": 100, "discount": 10}}"#,
            ))
            .await
            .unwrap();

        // 4 × $50.00 = $200.00
        let priced = service
            .apply_coupon(&CouponRef::Id(coupon.id.clone()), &cart(&[("A", 4)]))
            .await
            .unwrap();

        assert_eq!(priced.total_price, Money::from_cents(20000));
        assert_eq!(priced.total_discount, Money::from_cents(2000));
        assert_eq!(priced.final_price, Money::from_cents(18000));
        assert_eq!(priced.message, "Cart-wise discount applied!");
    }

    #[tokio::test]
    async fn test_bxgy_end_to_end_by_code() {
        let service = service().await;
        let coupon = service
            .create_coupon(request(
                r#"{"type": "bxgy", "details": {
                    "buy_products": [{"product_id": "A", "quantity": 2}],
                    "get_products": [{"product_id": "B", "quantity": 1}],
                    "repetition_limit": 2}}"#,
            ))
            .await
            .unwrap();

        let priced = service
            .apply_coupon(&CouponRef::Code(coupon.code.clone()), &cart(&[("A", 4), ("B", 1)]))
            .await
            .unwrap();

        let b = priced.item_for("B").unwrap();
        assert_eq!(b.quantity, 3);
        assert_eq!(b.discount, Money::from_cents(5000));
        assert_eq!(priced.total_discount, Money::from_cents(5000));
        assert_eq!(priced.total_price, Money::from_cents(22500));
    }

    #[tokio::test]
    async fn test_apply_error_codes() {
        let service = service().await;
        let inactive = service
            .create_coupon(request(
                r#"{"type": "cart_wise", "details": {"discount": 10}, "is_active": false}"#,
            ))
            .await
            .unwrap();
        let high_threshold = service
            .create_coupon(request(
                r#"{"type": "cart_wise", "details": {"threshold": 1000, "discount": 10}}"#,
            ))
            .await
            .unwrap();
        let cart = cart(&[("C", 1)]);

        let err = service
            .apply_coupon(&CouponRef::Id(inactive.id), &cart)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponInactive);

        let err = service
            .apply_coupon(&CouponRef::Any(high_threshold.code), &cart)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponNotApplicable);

        let err = service
            .apply_coupon(&CouponRef::Any("missing".to_string()), &cart)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_list_applicable() {
        let service = service().await;
        let product_wise = service
            .create_coupon(request(
                r#"{"type": "product_wise", "details": {"product_id": "C", "discount": 20}}"#,
            ))
            .await
            .unwrap();
        service
            .create_coupon(request(
                r#"{"type": "product_wise", "details": {"product_id": "B", "discount": 20}}"#,
            ))
            .await
            .unwrap();

        let applicable = service
            .list_applicable_coupons(&cart(&[("C", 3)]))
            .await
            .unwrap();
        assert_eq!(applicable.len(), 1);
        assert_eq!(applicable[0].coupon_id, product_wise.id);
        assert_eq!(applicable[0].kind, CouponKind::ProductWise);
        assert_eq!(applicable[0].discount, Money::from_cents(600));

        let err = service
            .list_applicable_coupons(&Cart::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyCart);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = service().await;
        let coupon = service
            .create_coupon(request(r#"{"type": "cart_wise", "details": {"discount": 10}}"#))
            .await
            .unwrap();

        let updated = service
            .update_coupon(
                &coupon.id,
                request(
                    r#"{"type": "product_wise", "details": {"product_id": "A", "discount": 5},
                        "expiry_date": "2027-01-01"}"#,
                ),
            )
            .await
            .unwrap();
        assert_eq!(updated.code, coupon.code);
        assert!(updated.is_active);
        assert_eq!(updated.expiry_date, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
        assert!(matches!(updated.rule, CouponRule::ProductWise { .. }));

        service.delete_coupon(&coupon.id).await.unwrap();
        assert_eq!(
            service.get_coupon(&coupon.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
        assert_eq!(
            service.delete_coupon(&coupon.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_list_coupons_paging() {
        let service = service().await;
        for _ in 0..3 {
            service
                .create_coupon(request(r#"{"type": "cart_wise", "details": {"discount": 10}}"#))
                .await
                .unwrap();
        }

        let page = service
            .list_coupons(&ListCouponsQuery {
                page: Some(1),
                size: Some(2),
                sort: Some("code".to_string()),
                direction: Some("desc".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);
        assert!(page.last);

        let err = service
            .list_coupons(&ListCouponsQuery {
                sort: Some("discount".to_string()),
                ..ListCouponsQuery::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_product_lookup() {
        let service = service().await;
        assert_eq!(service.get_product("B").await.unwrap().price_cents, 2500);
        assert_eq!(
            service.get_product("Z").await.unwrap_err().code,
            ErrorCode::NotFound
        );

        let generated = service
            .create_product(CreateProductRequest {
                id: None,
                name: "  Delta ".to_string(),
                price_cents: 100,
            })
            .await
            .unwrap();
        assert_eq!(generated.name, "Delta");
    }
}
