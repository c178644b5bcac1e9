//! # Seed Data Generator
//!
//! Populates the database with a small catalog and one coupon of each kind
//! for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./coupons_dev.db
//! cargo run -p coupon-db --bin seed
//!
//! # Specify database path and coupon validity
//! cargo run -p coupon-db --bin seed -- --db ./data/coupons.db --months 6
//! ```
//!
//! ## Generated Data
//! - Products `SKU-001` .. `SKU-012` priced $5.00 - $60.00
//! - A cart-wise coupon: 10% off carts of $100.00 or more
//! - A product-wise coupon: 20% off `SKU-001`
//! - A BxGy coupon: buy 2 of `SKU-002` or 3 of `SKU-003`, get `SKU-004`
//!   free, at most 3 times per pair

use chrono::{Months, Utc};
use coupon_core::{BxGyPair, Coupon, CouponRule, Money, Percentage, Product};
use coupon_db::repository::coupon::{generate_coupon_code, generate_coupon_id};
use coupon_db::{Database, DbConfig};
use std::env;

/// Catalog products: (name, price in cents)
const PRODUCTS: &[(&str, i64)] = &[
    ("Espresso Beans 1kg", 2400),
    ("Ceramic Mug", 1200),
    ("Paper Filters 100ct", 500),
    ("Milk Frother", 3500),
    ("Pour-Over Kettle", 6000),
    ("Grinder Brush", 650),
    ("Cold Brew Jar", 2800),
    ("Tamper", 1900),
    ("Travel Tumbler", 2200),
    ("Descaler", 900),
    ("Scale", 4500),
    ("Tea Sampler", 1550),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./coupons_dev.db");
    let mut months: u32 = 3;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--months" | "-m" => {
                if i + 1 < args.len() {
                    months = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Coupon Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: ./coupons_dev.db)");
                println!("  -m, --months <N>      Coupon validity in months (default: 3)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Coupon Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");
    for (idx, (name, price_cents)) in PRODUCTS.iter().enumerate() {
        let product = Product::new(sku(idx + 1), *name, Money::from_cents(*price_cents));
        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.id, e);
        }
    }
    println!("✓ Generated {} products", db.products().count().await?);

    println!();
    println!("Generating coupons...");
    let expiry_date = Utc::now()
        .date_naive()
        .checked_add_months(Months::new(months))
        .ok_or("expiry date out of range")?;

    let rules = [
        CouponRule::CartWide {
            threshold: Some(Money::from_cents(10000)),
            discount: Percentage::from_percent(10),
        },
        CouponRule::ProductWise {
            product_id: sku(1),
            discount: Percentage::from_percent(20),
        },
        CouponRule::BuyXGetY {
            pairs: vec![
                BxGyPair {
                    buy_product_id: sku(2),
                    buy_quantity: 2,
                    get_product_id: sku(4),
                    get_quantity: 1,
                    repetition_limit: Some(3),
                },
                BxGyPair {
                    buy_product_id: sku(3),
                    buy_quantity: 3,
                    get_product_id: sku(4),
                    get_quantity: 1,
                    repetition_limit: Some(3),
                },
            ],
        },
    ];

    for rule in rules {
        let now = Utc::now();
        let coupon = Coupon {
            id: generate_coupon_id(),
            code: generate_coupon_code(),
            is_active: true,
            expiry_date,
            rule,
            created_at: now,
            updated_at: now,
        };
        match db.coupons().insert(&coupon).await {
            Ok(c) => println!("  {} {:<12} expires {}", c.code, c.kind(), c.expiry_date),
            Err(e) => eprintln!("Failed to insert coupon {}: {}", coupon.code, e),
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn sku(n: usize) -> String {
    format!("SKU-{:03}", n)
}
