//! # coupon-service
//!
//! Service layer for coupon management and cart pricing.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Coupon Service                                   │
//! │                                                                         │
//! │  CLI (clap) ───► CouponService ───► coupon-db (SQLite, snapshots)      │
//! │                        │                                                │
//! │                        └──────────► coupon-core (DiscountEngine)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment-based configuration
//! - [`dto`] - Request and response shapes
//! - [`error`] - `ServiceError` with machine-readable codes
//! - [`service`] - `CouponService` operations
//! - [`cli`] - Command line entry point

pub mod cli;
pub mod config;
pub mod dto;
pub mod error;
pub mod service;

pub use cli::run;
pub use config::{ConfigError, ServiceConfig};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use service::CouponService;
