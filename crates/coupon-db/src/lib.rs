//! # coupon-db: Database Layer for the Coupon Service
//!
//! SQLite storage for coupons, BxGy pairs and catalog products, using sqlx
//! for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Coupon Data Flow                                 │
//! │                                                                         │
//! │  CouponService (apps/coupon-service)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     coupon-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ CouponRepo    │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ ProductRepo   │    │ 001_init.sql │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │           ▼                                                     │   │
//! │  │   Snapshot ──► coupon-core in-memory stores ──► DiscountEngine  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Coupon and product repositories, pagination
//! - [`snapshot`] - Loading evaluation inputs into coupon-core stores
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coupon_db::{Database, DbConfig, Snapshot};
//!
//! let db = Database::new(DbConfig::new("./coupons.db")).await?;
//!
//! let coupon = db.coupons().get_by_code("COUPON-1A2B3C4D").await?;
//! let snapshot = Snapshot::for_all(&db, &cart).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod snapshot;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use snapshot::Snapshot;

// Repository re-exports for convenience
pub use repository::coupon::CouponRepository;
pub use repository::page::{Page, PageRequest, SortDirection, SortField};
pub use repository::product::ProductRepository;
