//! # Repository Module
//!
//! Database repository implementations for the coupon service.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CouponService                                                         │
//! │       │                                                                 │
//! │       │  db.coupons().list_page(&request)                              │
//! │       ▼                                                                 │
//! │  CouponRepository                    ProductRepository                 │
//! │  ├── insert / update / delete        ├── insert / update               │
//! │  ├── get_by_id / get_by_code         ├── get_by_id                     │
//! │  ├── list_all / list_page            ├── get_many                      │
//! │  └── list_pairs                      └── list / count                  │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`coupon::CouponRepository`] - Coupons and their BxGy pairs
//! - [`product::ProductRepository`] - Catalog products
//!
//! [`page`] holds the pagination types shared by listings.

pub mod coupon;
pub mod page;
pub mod product;
