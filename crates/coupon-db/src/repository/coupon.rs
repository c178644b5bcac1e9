//! # Coupon Repository
//!
//! Database operations for coupons and their BxGy pairs.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  coupons                                 bxgy_pairs                     │
//! │  ─────────────────────────────           ────────────────────────────   │
//! │  id, code, kind, is_active,     1 ──── * coupon_id, position,          │
//! │  expiry_date,                            buy_product_id, buy_quantity, │
//! │  threshold_cents  (cart_wise)            get_product_id, get_quantity, │
//! │  discount_bps     (cart/product)         repetition_limit              │
//! │  product_id       (product_wise)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A coupon row plus its ordered pairs maps back to exactly one
//! [`CouponRule`]. Rows that cannot (a cart_wise row without a discount, a
//! bxgy coupon with no pairs) surface as [`DbError::Corrupt`].
//!
//! Every write touching more than one row runs in a single transaction.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::page::{Page, PageRequest};
use coupon_core::{BxGyPair, Coupon, CouponKind, CouponRule, Money, Percentage};

const COUPON_COLUMNS: &str = "id, code, kind, is_active, expiry_date, \
     threshold_cents, discount_bps, product_id, created_at, updated_at";

const PAIR_COLUMNS: &str = "coupon_id, buy_product_id, buy_quantity, \
     get_product_id, get_quantity, repetition_limit";

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct CouponRow {
    id: String,
    code: String,
    kind: CouponKind,
    is_active: bool,
    expiry_date: NaiveDate,
    threshold_cents: Option<i64>,
    discount_bps: Option<i64>,
    product_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PairRow {
    coupon_id: String,
    buy_product_id: String,
    buy_quantity: i64,
    get_product_id: String,
    get_quantity: i64,
    repetition_limit: Option<i64>,
}

impl From<PairRow> for BxGyPair {
    fn from(row: PairRow) -> Self {
        BxGyPair {
            buy_product_id: row.buy_product_id,
            buy_quantity: row.buy_quantity,
            get_product_id: row.get_product_id,
            get_quantity: row.get_quantity,
            repetition_limit: row.repetition_limit,
        }
    }
}

impl CouponRow {
    fn into_coupon(self, pairs: Vec<BxGyPair>) -> DbResult<Coupon> {
        let rule = match self.kind {
            CouponKind::CartWide => CouponRule::CartWide {
                threshold: self.threshold_cents.map(Money::from_cents),
                discount: self.discount()?,
            },
            CouponKind::ProductWise => CouponRule::ProductWise {
                product_id: self
                    .product_id
                    .clone()
                    .ok_or_else(|| DbError::corrupt("coupon", &self.id, "missing product_id"))?,
                discount: self.discount()?,
            },
            CouponKind::BuyXGetY => {
                if pairs.is_empty() {
                    return Err(DbError::corrupt("coupon", &self.id, "bxgy coupon has no pairs"));
                }
                CouponRule::BuyXGetY { pairs }
            }
        };

        Ok(Coupon {
            id: self.id,
            code: self.code,
            is_active: self.is_active,
            expiry_date: self.expiry_date,
            rule,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    fn discount(&self) -> DbResult<Percentage> {
        let bps = self
            .discount_bps
            .ok_or_else(|| DbError::corrupt("coupon", &self.id, "missing discount_bps"))?;
        u32::try_from(bps)
            .map(Percentage::from_bps)
            .map_err(|_| DbError::corrupt("coupon", &self.id, "discount_bps out of range"))
    }
}

/// Kind-specific columns of a rule: (threshold_cents, discount_bps, product_id).
fn rule_columns(rule: &CouponRule) -> (Option<i64>, Option<i64>, Option<&str>) {
    match rule {
        CouponRule::CartWide {
            threshold,
            discount,
        } => (threshold.map(|t| t.cents()), Some(discount.bps() as i64), None),
        CouponRule::ProductWise {
            product_id,
            discount,
        } => (None, Some(discount.bps() as i64), Some(product_id.as_str())),
        CouponRule::BuyXGetY { .. } => (None, None, None),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for coupon database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.coupons();
///
/// repo.insert(&coupon).await?;
/// let found = repo.get_by_code("COUPON-1A2B3C4D").await?;
/// let page = repo.list_page(&PageRequest::new(0, 10, SortField::Id, SortDirection::Asc)?).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets a coupon (with its pairs) by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate_one(row).await
    }

    /// Gets a coupon (with its pairs) by its code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate_one(row).await
    }

    /// Lists every coupon in insertion order.
    pub async fn list_all(&self) -> DbResult<Vec<Coupon>> {
        let rows = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded all coupons");
        self.hydrate(rows).await
    }

    /// Lists one page of coupons.
    ///
    /// The sort column comes from [`SortField::column`], never from caller
    /// text. Ties are broken by id so pages are stable.
    ///
    /// [`SortField::column`]: crate::repository::page::SortField::column
    pub async fn list_page(&self, request: &PageRequest) -> DbResult<Page<Coupon>> {
        debug!(
            page = request.page,
            size = request.size,
            sort = request.sort.column(),
            direction = %request.direction,
            "Listing coupons"
        );

        let rows = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY {} {}, id ASC LIMIT ?1 OFFSET ?2",
            request.sort.column(),
            request.direction.as_sql()
        ))
        .bind(request.size as i64)
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.count().await?;
        let coupons = self.hydrate(rows).await?;
        Ok(Page::new(coupons, request, total))
    }

    /// Pairs of a coupon in configured order.
    pub async fn list_pairs(&self, coupon_id: &str) -> DbResult<Vec<BxGyPair>> {
        let rows = sqlx::query_as::<_, PairRow>(&format!(
            "SELECT {PAIR_COLUMNS} FROM bxgy_pairs WHERE coupon_id = ?1 ORDER BY position"
        ))
        .bind(coupon_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BxGyPair::from).collect())
    }

    /// Counts all coupons.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Inserts a coupon and its pairs in one transaction.
    ///
    /// ## Returns
    /// * `Ok(Coupon)` - Inserted coupon
    /// * `Err(DbError::UniqueViolation)` - code (or id) already exists
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<Coupon> {
        debug!(id = %coupon.id, code = %coupon.code, kind = %coupon.kind(), "Inserting coupon");

        let (threshold_cents, discount_bps, product_id) = rule_columns(&coupon.rule);

        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, kind, is_active, expiry_date,
                threshold_cents, discount_bps, product_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.kind())
        .bind(coupon.is_active)
        .bind(coupon.expiry_date)
        .bind(threshold_cents)
        .bind(discount_bps)
        .bind(product_id)
        .bind(coupon.created_at)
        .bind(coupon.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.ends_with("code") => {
                DbError::duplicate("code", &coupon.code)
            }
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &coupon.id),
            other => other,
        })?;

        insert_pairs(&mut tx, &coupon.id, coupon.bxgy_pairs()).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %coupon.id, code = %coupon.code, "Coupon created");
        Ok(coupon.clone())
    }

    /// Replaces a coupon's rule, pairs, active flag and expiry date.
    ///
    /// The code and creation time never change.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Coupon doesn't exist
    pub async fn update(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(id = %coupon.id, kind = %coupon.kind(), "Updating coupon");

        let (threshold_cents, discount_bps, product_id) = rule_columns(&coupon.rule);

        let mut tx = self.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE coupons SET
                kind = ?2,
                is_active = ?3,
                expiry_date = ?4,
                threshold_cents = ?5,
                discount_bps = ?6,
                product_id = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&coupon.id)
        .bind(coupon.kind())
        .bind(coupon.is_active)
        .bind(coupon.expiry_date)
        .bind(threshold_cents)
        .bind(discount_bps)
        .bind(product_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", &coupon.id));
        }

        sqlx::query("DELETE FROM bxgy_pairs WHERE coupon_id = ?1")
            .bind(&coupon.id)
            .execute(&mut *tx)
            .await?;

        insert_pairs(&mut tx, &coupon.id, coupon.bxgy_pairs()).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %coupon.id, "Coupon updated");
        Ok(())
    }

    /// Deletes a coupon and its pairs in one transaction.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting coupon");

        let mut tx = self.begin().await?;

        let pairs = sqlx::query("DELETE FROM bxgy_pairs WHERE coupon_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM coupons WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %id, pairs = pairs.rows_affected(), "Coupon deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    async fn hydrate_one(&self, row: Option<CouponRow>) -> DbResult<Option<Coupon>> {
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    /// Attaches pairs to BxGy rows and maps every row to a Coupon.
    async fn hydrate(&self, rows: Vec<CouponRow>) -> DbResult<Vec<Coupon>> {
        let bxgy_ids: Vec<&str> = rows
            .iter()
            .filter(|r| r.kind == CouponKind::BuyXGetY)
            .map(|r| r.id.as_str())
            .collect();

        let mut pairs = self.pairs_by_coupon(&bxgy_ids).await?;

        rows.into_iter()
            .map(|row| {
                let coupon_pairs = pairs.remove(&row.id).unwrap_or_default();
                row.into_coupon(coupon_pairs)
            })
            .collect()
    }

    async fn pairs_by_coupon(
        &self,
        coupon_ids: &[&str],
    ) -> DbResult<HashMap<String, Vec<BxGyPair>>> {
        let mut grouped: HashMap<String, Vec<BxGyPair>> = HashMap::new();
        if coupon_ids.is_empty() {
            return Ok(grouped);
        }

        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {PAIR_COLUMNS} FROM bxgy_pairs WHERE coupon_id IN ("
        ));
        let mut separated = query.separated(", ");
        for id in coupon_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY coupon_id, position");

        let rows = query
            .build_query_as::<PairRow>()
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            grouped
                .entry(row.coupon_id.clone())
                .or_default()
                .push(BxGyPair::from(row));
        }
        Ok(grouped)
    }
}

async fn insert_pairs(
    tx: &mut Transaction<'static, Sqlite>,
    coupon_id: &str,
    pairs: &[BxGyPair],
) -> DbResult<()> {
    for (position, pair) in pairs.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO bxgy_pairs (
                coupon_id, position,
                buy_product_id, buy_quantity,
                get_product_id, get_quantity,
                repetition_limit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(coupon_id)
        .bind(position as i64)
        .bind(&pair.buy_product_id)
        .bind(pair.buy_quantity)
        .bind(&pair.get_product_id)
        .bind(pair.get_quantity)
        .bind(pair.repetition_limit)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Identifier Generation
// =============================================================================

/// Generates a new coupon ID (UUID v4).
pub fn generate_coupon_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a coupon code: `COUPON-` followed by 8 upper-case hex digits.
///
/// ```rust
/// let code = coupon_db::repository::coupon::generate_coupon_code();
/// assert!(code.starts_with("COUPON-"));
/// assert_eq!(code.len(), 15);
/// ```
pub fn generate_coupon_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("COUPON-{}", hex[..8].to_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::page::{SortDirection, SortField};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn coupon(code: &str, rule: CouponRule) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: generate_coupon_id(),
            code: code.to_string(),
            is_active: true,
            expiry_date: date(2026, 12, 31),
            rule,
            created_at: now,
            updated_at: now,
        }
    }

    fn cart_wide() -> CouponRule {
        CouponRule::CartWide {
            threshold: Some(Money::from_cents(10000)),
            discount: Percentage::from_percent(10),
        }
    }

    fn bxgy() -> CouponRule {
        CouponRule::BuyXGetY {
            pairs: vec![
                BxGyPair {
                    buy_product_id: "A".to_string(),
                    buy_quantity: 2,
                    get_product_id: "B".to_string(),
                    get_quantity: 1,
                    repetition_limit: Some(3),
                },
                BxGyPair {
                    buy_product_id: "C".to_string(),
                    buy_quantity: 3,
                    get_product_id: "B".to_string(),
                    get_quantity: 1,
                    repetition_limit: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_round_trip_all_kinds() {
        let db = db().await;
        let repo = db.coupons();

        let rules = [
            cart_wide(),
            CouponRule::CartWide {
                threshold: None,
                discount: Percentage::from_bps(1250),
            },
            CouponRule::ProductWise {
                product_id: "A".to_string(),
                discount: Percentage::from_percent(20),
            },
            bxgy(),
        ];

        for (i, rule) in rules.into_iter().enumerate() {
            let original = coupon(&format!("CODE-{i}"), rule);
            repo.insert(&original).await.unwrap();

            let by_id = repo.get_by_id(&original.id).await.unwrap().unwrap();
            assert_eq!(by_id.rule, original.rule);
            assert_eq!(by_id.code, original.code);
            assert_eq!(by_id.expiry_date, original.expiry_date);
            assert!(by_id.is_active);

            let by_code = repo.get_by_code(&original.code).await.unwrap().unwrap();
            assert_eq!(by_code.id, original.id);
        }

        assert_eq!(repo.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_pairs_keep_order() {
        let db = db().await;
        let repo = db.coupons();
        let original = coupon("BXGY-1", bxgy());
        repo.insert(&original).await.unwrap();

        let pairs = repo.list_pairs(&original.id).await.unwrap();
        assert_eq!(pairs, original.bxgy_pairs());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = db().await;
        let repo = db.coupons();
        repo.insert(&coupon("SAME", cart_wide())).await.unwrap();

        let err = repo.insert(&coupon("SAME", cart_wide())).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { field, value } if field == "code" && value == "SAME"));
    }

    #[tokio::test]
    async fn test_missing_lookups_return_none() {
        let db = db().await;
        let repo = db.coupons();
        assert!(repo.get_by_id("nope").await.unwrap().is_none());
        assert!(repo.get_by_code("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_rule_and_pairs() {
        let db = db().await;
        let repo = db.coupons();
        let mut stored = coupon("SWITCH", bxgy());
        repo.insert(&stored).await.unwrap();

        stored.rule = CouponRule::ProductWise {
            product_id: "Z".to_string(),
            discount: Percentage::from_percent(5),
        };
        stored.is_active = false;
        stored.expiry_date = date(2027, 1, 31);
        repo.update(&stored).await.unwrap();

        let reloaded = repo.get_by_id(&stored.id).await.unwrap().unwrap();
        assert_eq!(reloaded.rule, stored.rule);
        assert!(!reloaded.is_active);
        assert_eq!(reloaded.expiry_date, date(2027, 1, 31));
        assert_eq!(reloaded.code, "SWITCH");
        assert!(repo.list_pairs(&stored.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_coupon() {
        let db = db().await;
        let err = db.coupons().update(&coupon("GHOST", cart_wide())).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_cascades_pairs() {
        let db = db().await;
        let repo = db.coupons();
        let stored = coupon("BXGY-DEL", bxgy());
        repo.insert(&stored).await.unwrap();

        repo.delete(&stored.id).await.unwrap();

        assert!(repo.get_by_id(&stored.id).await.unwrap().is_none());
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bxgy_pairs")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 0);

        assert!(matches!(
            repo.delete(&stored.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_all_in_insertion_order() {
        let db = db().await;
        let repo = db.coupons();
        let codes = ["ZULU", "ALPHA", "MIKE"];
        for code in codes {
            repo.insert(&coupon(code, cart_wide())).await.unwrap();
        }

        let listed: Vec<_> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        assert_eq!(listed, codes);
    }

    #[tokio::test]
    async fn test_list_page_sorted() {
        let db = db().await;
        let repo = db.coupons();
        for (i, day) in [5, 1, 3, 4, 2].into_iter().enumerate() {
            let mut c = coupon(&format!("C-{i}"), bxgy());
            c.expiry_date = date(2026, 7, day);
            repo.insert(&c).await.unwrap();
        }

        let request = PageRequest::new(0, 2, SortField::ExpiryDate, SortDirection::Desc).unwrap();
        let first = repo.list_page(&request).await.unwrap();
        let days: Vec<_> = first.content.iter().map(|c| c.expiry_date).collect();
        assert_eq!(days, vec![date(2026, 7, 5), date(2026, 7, 4)]);
        assert_eq!(first.total_elements, 5);
        assert_eq!(first.total_pages, 3);
        assert!(!first.last);
        assert!(first.content.iter().all(|c| c.bxgy_pairs().len() == 2));

        let request = PageRequest::new(2, 2, SortField::ExpiryDate, SortDirection::Desc).unwrap();
        let last = repo.list_page(&request).await.unwrap();
        assert_eq!(last.content.len(), 1);
        assert_eq!(last.content[0].expiry_date, date(2026, 7, 1));
        assert!(last.last);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let db = db().await;
        let repo = db.coupons();
        let stored = coupon("BROKEN", bxgy());
        repo.insert(&stored).await.unwrap();

        sqlx::query("DELETE FROM bxgy_pairs WHERE coupon_id = ?1")
            .bind(&stored.id)
            .execute(db.pool())
            .await
            .unwrap();

        assert!(matches!(
            repo.get_by_id(&stored.id).await,
            Err(DbError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_generate_coupon_code_format() {
        let code = generate_coupon_code();
        assert!(code.starts_with("COUPON-"));
        let suffix = &code["COUPON-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_ne!(generate_coupon_code(), code);
    }
}
