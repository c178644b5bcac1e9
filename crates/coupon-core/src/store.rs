//! # Lookup Contracts
//!
//! The engine never touches storage directly. It reads products through
//! [`CatalogLookup`] and coupons through [`CouponStore`].
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────┐
//! │  DiscountEngine  │───────►│  CatalogLookup   │  product id → Product
//! └──────────────────┘        └──────────────────┘
//! ┌──────────────────┐        ┌──────────────────┐
//! │     checkout     │───────►│   CouponStore    │  id / code → Coupon
//! └──────────────────┘        └──────────────────┘
//!                                      ▲
//!                                      │ filled from SQLite by coupon-db
//!                              InMemory* stores
//! ```
//!
//! Both traits are synchronous and read-only. The database layer loads a
//! snapshot into the in-memory implementations before an evaluation runs.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{BxGyPair, Coupon, Product};

// =============================================================================
// Traits
// =============================================================================

/// Resolves a product id to its catalog entry.
pub trait CatalogLookup: Send + Sync {
    /// Fails with [`CoreError::ProductNotFound`] for unknown ids.
    fn get_product(&self, product_id: &str) -> CoreResult<Product>;
}

/// Read access to coupon definitions.
pub trait CouponStore: Send + Sync {
    /// Fails with [`CoreError::CouponNotFound`] for unknown ids.
    fn get_by_id(&self, coupon_id: &str) -> CoreResult<Coupon>;

    /// Fails with [`CoreError::CouponNotFound`] for unknown codes.
    fn get_by_code(&self, code: &str) -> CoreResult<Coupon>;

    /// Every stored coupon, regardless of validity.
    fn list_all(&self) -> CoreResult<Vec<Coupon>>;

    /// Pairs of a BxGy coupon in configured order. Empty for other kinds.
    fn list_bxgy_pairs(&self, coupon_id: &str) -> CoreResult<Vec<BxGyPair>> {
        Ok(self.get_by_id(coupon_id)?.bxgy_pairs().to_vec())
    }
}

// =============================================================================
// In-Memory Catalog
// =============================================================================

/// Catalog backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: HashMap<String, Product>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<Product> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        let mut catalog = InMemoryCatalog::new();
        for product in iter {
            catalog.insert(product);
        }
        catalog
    }
}

impl CatalogLookup for InMemoryCatalog {
    fn get_product(&self, product_id: &str) -> CoreResult<Product> {
        self.products
            .get(product_id)
            .cloned()
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))
    }
}

// =============================================================================
// In-Memory Coupon Store
// =============================================================================

/// Coupon store backed by a `Vec` plus id and code indexes.
///
/// `list_all` returns coupons in insertion order, which keeps applicable
/// coupon listings stable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCouponStore {
    coupons: Vec<Coupon>,
    by_id: HashMap<String, usize>,
    by_code: HashMap<String, usize>,
}

impl InMemoryCouponStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a coupon, replacing any stored coupon with the same id.
    pub fn insert(&mut self, coupon: Coupon) {
        match self.by_id.get(&coupon.id) {
            Some(&index) => {
                self.by_code.remove(&self.coupons[index].code);
                self.by_code.insert(coupon.code.clone(), index);
                self.coupons[index] = coupon;
            }
            None => {
                let index = self.coupons.len();
                self.by_id.insert(coupon.id.clone(), index);
                self.by_code.insert(coupon.code.clone(), index);
                self.coupons.push(coupon);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }
}

impl FromIterator<Coupon> for InMemoryCouponStore {
    fn from_iter<I: IntoIterator<Item = Coupon>>(iter: I) -> Self {
        let mut store = InMemoryCouponStore::new();
        for coupon in iter {
            store.insert(coupon);
        }
        store
    }
}

impl CouponStore for InMemoryCouponStore {
    fn get_by_id(&self, coupon_id: &str) -> CoreResult<Coupon> {
        self.by_id
            .get(coupon_id)
            .map(|&i| self.coupons[i].clone())
            .ok_or_else(|| CoreError::CouponNotFound(coupon_id.to_string()))
    }

    fn get_by_code(&self, code: &str) -> CoreResult<Coupon> {
        self.by_code
            .get(code)
            .map(|&i| self.coupons[i].clone())
            .ok_or_else(|| CoreError::CouponNotFound(code.to_string()))
    }

    fn list_all(&self) -> CoreResult<Vec<Coupon>> {
        Ok(self.coupons.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{CouponRule, Percentage};
    use chrono::{NaiveDate, Utc};

    fn coupon(id: &str, code: &str, rule: CouponRule) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: id.to_string(),
            code: code.to_string(),
            is_active: true,
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            rule,
            created_at: now,
            updated_at: now,
        }
    }

    fn cart_wide() -> CouponRule {
        CouponRule::CartWide {
            threshold: None,
            discount: Percentage::from_percent(5),
        }
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog: InMemoryCatalog = [Product::new("A", "Apple", Money::from_cents(50))]
            .into_iter()
            .collect();

        assert_eq!(catalog.get_product("A").unwrap().price().cents(), 50);
        assert!(matches!(
            catalog.get_product("Z"),
            Err(CoreError::ProductNotFound(id)) if id == "Z"
        ));
    }

    #[test]
    fn test_coupon_lookup_by_id_and_code() {
        let store: InMemoryCouponStore = [coupon("c-1", "COUPON-AAAA0001", cart_wide())]
            .into_iter()
            .collect();

        assert_eq!(store.get_by_id("c-1").unwrap().code, "COUPON-AAAA0001");
        assert_eq!(store.get_by_code("COUPON-AAAA0001").unwrap().id, "c-1");
        assert!(matches!(
            store.get_by_code("NOPE"),
            Err(CoreError::CouponNotFound(_))
        ));
    }

    #[test]
    fn test_list_all_keeps_insertion_order() {
        let store: InMemoryCouponStore = ["c-3", "c-1", "c-2"]
            .iter()
            .enumerate()
            .map(|(i, id)| coupon(id, &format!("CODE-{i}"), cart_wide()))
            .collect();

        let ids: Vec<_> = store.list_all().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c-3", "c-1", "c-2"]);
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut store = InMemoryCouponStore::new();
        store.insert(coupon("c-1", "OLD", cart_wide()));
        store.insert(coupon("c-1", "NEW", cart_wide()));

        assert_eq!(store.len(), 1);
        assert!(store.get_by_code("OLD").is_err());
        assert_eq!(store.get_by_code("NEW").unwrap().id, "c-1");
    }

    #[test]
    fn test_list_bxgy_pairs() {
        let pair = BxGyPair {
            buy_product_id: "A".to_string(),
            buy_quantity: 2,
            get_product_id: "B".to_string(),
            get_quantity: 1,
            repetition_limit: Some(3),
        };
        let store: InMemoryCouponStore = [
            coupon("b-1", "BXGY", CouponRule::BuyXGetY { pairs: vec![pair.clone()] }),
            coupon("c-1", "CART", cart_wide()),
        ]
        .into_iter()
        .collect();

        assert_eq!(store.list_bxgy_pairs("b-1").unwrap(), vec![pair]);
        assert!(store.list_bxgy_pairs("c-1").unwrap().is_empty());
        assert!(store.list_bxgy_pairs("missing").is_err());
    }
}
