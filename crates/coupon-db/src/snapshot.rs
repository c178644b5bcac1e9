//! # Evaluation Snapshots
//!
//! Loads exactly the rows one evaluation needs into the in-memory stores
//! from `coupon-core`, so the discount engine itself never touches I/O.
//!
//! ```text
//! ┌──────────────┐   for_reference / for_all    ┌──────────────────────────┐
//! │   Database   │ ───────────────────────────► │ Snapshot                 │
//! │  coupons     │                              │  ├── InMemoryCouponStore │
//! │  bxgy_pairs  │                              │  └── InMemoryCatalog     │
//! │  products    │                              └────────────┬─────────────┘
//! └──────────────┘                                           │
//!                                                            ▼
//!                                     checkout::apply_coupon / list_applicable_coupons
//! ```
//!
//! The catalog holds every product in the cart plus every product a loaded
//! coupon names (BxGy buy/get products, the product_wise target). Products
//! absent from the database are simply absent from the snapshot; the
//! engine reports them as `ProductNotFound` when it needs a price.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::DbResult;
use crate::pool::Database;
use coupon_core::checkout::CouponRef;
use coupon_core::store::{InMemoryCatalog, InMemoryCouponStore};
use coupon_core::{Cart, Coupon, CouponRule};

/// Point-in-time copy of the coupons and products an evaluation reads.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub catalog: InMemoryCatalog,
    pub coupons: InMemoryCouponStore,
}

impl Snapshot {
    /// Snapshot for applying a single coupon.
    ///
    /// A reference that matches nothing leaves the coupon store empty, so
    /// resolving it against the snapshot yields `CouponNotFound`.
    pub async fn for_reference(db: &Database, reference: &CouponRef, cart: &Cart) -> DbResult<Self> {
        let repo = db.coupons();
        let coupon = match reference {
            CouponRef::Id(id) => repo.get_by_id(id).await?,
            CouponRef::Code(code) => repo.get_by_code(code).await?,
            CouponRef::Any(value) => match repo.get_by_id(value).await? {
                Some(coupon) => Some(coupon),
                None => repo.get_by_code(value).await?,
            },
        };

        let coupons: Vec<Coupon> = coupon.into_iter().collect();
        Self::load(db, coupons, cart).await
    }

    /// Snapshot holding every stored coupon.
    pub async fn for_all(db: &Database, cart: &Cart) -> DbResult<Self> {
        let coupons = db.coupons().list_all().await?;
        Self::load(db, coupons, cart).await
    }

    async fn load(db: &Database, coupons: Vec<Coupon>, cart: &Cart) -> DbResult<Self> {
        let ids = referenced_product_ids(&coupons, cart);
        let products = db.products().get_many(&ids).await?;

        debug!(
            coupons = coupons.len(),
            requested_products = ids.len(),
            loaded_products = products.len(),
            "Loaded evaluation snapshot"
        );

        Ok(Snapshot {
            catalog: products.into_iter().collect(),
            coupons: coupons.into_iter().collect(),
        })
    }
}

/// Sorted, de-duplicated product ids named by the cart or the coupons.
fn referenced_product_ids(coupons: &[Coupon], cart: &Cart) -> Vec<String> {
    let mut ids: BTreeSet<&str> = cart.lines().iter().map(|l| l.product_id.as_str()).collect();

    for coupon in coupons {
        match &coupon.rule {
            CouponRule::CartWide { .. } => {}
            CouponRule::ProductWise { product_id, .. } => {
                ids.insert(product_id.as_str());
            }
            CouponRule::BuyXGetY { pairs } => {
                for pair in pairs {
                    ids.insert(pair.buy_product_id.as_str());
                    ids.insert(pair.get_product_id.as_str());
                }
            }
        }
    }

    ids.into_iter().map(str::to_string).collect()
}
