use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::config::ServiceConfig;
use crate::dto::{ApplicableCouponsResponse, CouponRequest, CreateProductRequest, ListCouponsQuery};
use crate::service::CouponService;
use coupon_core::checkout::CouponRef;
use coupon_core::Cart;

#[derive(Parser, Debug)]
#[command(
    name = "coupon-service",
    about = "Manage coupons and price carts against them",
    version
)]
struct Cli {
    /// Override COUPON_DB_PATH
    #[arg(long, global = true)]
    db: Option<String>,

    /// Override COUPON_EVALUATION_DATE (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<chrono::NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a coupon from a JSON request file
    Create(FileArgs),
    /// List coupons one page at a time
    List(ListArgs),
    /// Show one coupon
    Get(IdArgs),
    /// Replace a coupon's rule from a JSON request file
    Update(UpdateArgs),
    /// Delete a coupon and its BxGy pairs
    Delete(IdArgs),
    /// List every coupon that applies to a cart
    Applicable(CartArgs),
    /// Apply one coupon to a cart
    Apply(ApplyArgs),
    /// Catalog products
    Product {
        #[command(subcommand)]
        command: ProductCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProductCommand {
    /// Add a product from a JSON request file
    Add(FileArgs),
    /// Show one product
    Get(IdArgs),
}

#[derive(Args, Debug)]
struct FileArgs {
    /// JSON request file, `-` for stdin
    #[arg(long)]
    file: String,
}

#[derive(Args, Debug)]
struct IdArgs {
    id: String,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    id: String,
    /// JSON request file, `-` for stdin
    #[arg(long)]
    file: String,
}

#[derive(Args, Debug, Default)]
struct ListArgs {
    /// 0-based page index
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    size: Option<u32>,
    /// id, code, kind, expiry_date or created_at
    #[arg(long)]
    sort: Option<String>,
    /// asc or desc
    #[arg(long)]
    direction: Option<String>,
}

#[derive(Args, Debug)]
struct CartArgs {
    /// JSON cart file (`{"items": [...]}`), `-` for stdin
    #[arg(long)]
    cart: String,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Coupon id or code
    coupon: String,
    /// How to read the coupon argument
    #[arg(long, value_enum, default_value_t = RefKind::Any)]
    by: RefKind,
    /// JSON cart file (`{"items": [...]}`), `-` for stdin
    #[arg(long)]
    cart: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum RefKind {
    Id,
    Code,
    Any,
}

impl ApplyArgs {
    fn reference(&self) -> CouponRef {
        let value = self.coupon.clone();
        match self.by {
            RefKind::Id => CouponRef::Id(value),
            RefKind::Code => CouponRef::Code(value),
            RefKind::Any => CouponRef::Any(value),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ServiceConfig::load().context("loading configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(today) = cli.today {
        config.evaluation_date = Some(today);
    }
    info!(db = %config.db_path, today = %config.today(), "Configuration loaded");

    let service = CouponService::connect(config).await?;

    match cli.command {
        Command::Create(args) => {
            let request: CouponRequest = read_json(&args.file)?;
            print_json(&service.create_coupon(request).await?)
        }
        Command::List(args) => {
            let query = ListCouponsQuery {
                page: args.page,
                size: args.size,
                sort: args.sort,
                direction: args.direction,
            };
            print_json(&service.list_coupons(&query).await?)
        }
        Command::Get(args) => print_json(&service.get_coupon(&args.id).await?),
        Command::Update(args) => {
            let request: CouponRequest = read_json(&args.file)?;
            print_json(&service.update_coupon(&args.id, request).await?)
        }
        Command::Delete(args) => {
            service.delete_coupon(&args.id).await?;
            print_json(&serde_json::json!({ "deleted": args.id }))
        }
        Command::Applicable(args) => {
            let cart: Cart = read_json(&args.cart)?;
            let applicable_coupons = service.list_applicable_coupons(&cart).await?;
            print_json(&ApplicableCouponsResponse { applicable_coupons })
        }
        Command::Apply(args) => {
            let cart: Cart = read_json(&args.cart)?;
            print_json(&service.apply_coupon(&args.reference(), &cart).await?)
        }
        Command::Product {
            command: ProductCommand::Add(args),
        } => {
            let request: CreateProductRequest = read_json(&args.file)?;
            print_json(&service.create_product(request).await?)
        }
        Command::Product {
            command: ProductCommand::Get(args),
        } => print_json(&service.get_product(&args.id).await?),
    }
}

fn read_json<T: DeserializeOwned>(source: &str) -> anyhow::Result<T> {
    let raw = if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        buf
    } else {
        fs::read_to_string(Path::new(source)).with_context(|| format!("reading {source}"))?
    };
    serde_json::from_str(&raw).with_context(|| format!("parsing {source}"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_args() {
        let cli = Cli::try_parse_from([
            "coupon-service",
            "--db",
            ":memory:",
            "apply",
            "COUPON-1A2B3C4D",
            "--by",
            "code",
            "--cart",
            "cart.json",
        ])
        .unwrap();

        assert_eq!(cli.db.as_deref(), Some(":memory:"));
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.reference(), CouponRef::Code("COUPON-1A2B3C4D".to_string()));
    }

    #[test]
    fn test_list_args() {
        let cli = Cli::try_parse_from([
            "coupon-service",
            "list",
            "--page",
            "2",
            "--sort",
            "expiry_date",
            "--direction",
            "desc",
        ])
        .unwrap();

        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.page, Some(2));
        assert_eq!(args.size, None);
        assert_eq!(args.sort.as_deref(), Some("expiry_date"));
    }

    #[test]
    fn test_read_json_cart() {
        let path = std::env::temp_dir().join(format!("coupon-cli-cart-{}.json", std::process::id()));
        fs::write(&path, r#"{"items": [{"product_id": "A", "quantity": 2, "price": 1500}]}"#).unwrap();

        let cart: Cart = read_json(path.to_str().unwrap()).unwrap();
        assert_eq!(cart.quantity_of("A"), 2);

        fs::remove_file(&path).unwrap();
        assert!(read_json::<Cart>(path.to_str().unwrap()).is_err());
    }
}
