//! # coupon-service
//!
//! Command line front end of the coupon service.
//!
//! ```bash
//! coupon-service create --file cart_wise.json
//! coupon-service list --size 20 --sort expiry_date --direction desc
//! coupon-service apply COUPON-1A2B3C4D --cart cart.json
//! ```
//! Results are printed as pretty JSON on stdout; logs go to stderr
//! (`RUST_LOG`, default `info`).

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = coupon_service::run().await {
        eprintln!("coupon-service error: {err:#}");
        std::process::exit(1);
    }
}
