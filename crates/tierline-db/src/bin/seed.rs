//! # Seed Data Generator
//!
//! Populates a development database with a shop, sample discounts and
//! customers, so the storefront proxy has something to preview.
//!
//! ## Usage
//! ```bash
//! # Seed ./tierline_dev.db for demo.myshopify.com
//! cargo run -p tierline-db --bin seed
//!
//! # Specify database path and shop
//! cargo run -p tierline-db --bin seed -- --db ./data/tierline.db --shop my-store.myshopify.com
//! ```
//!
//! ## Generated Data
//! - One QUANTITY discount per scope in [`SCOPES`], with 2/4/8 unit tiers
//! - One PRICE discount covering the first [`PRICE_VARIANTS`] variants
//! - A VIP-only QUANTITY discount limited to the seeded VIP customer
//! - One scheduled discount (not yet live)

use std::env;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tierline_core::types::{
    ActiveWindow, Adjustment, ApplyScope, CustomerEligibility, DiscountRules, DiscountStatus,
    PriceTier, QuantityTier, VariantPriceTiers,
};
use tierline_core::{DiscountConfiguration, Money, StorefrontSettings};
use tierline_db::{Database, DbConfig};
use uuid::Uuid;

/// Scopes and targets for the sample QUANTITY discounts
const SCOPES: &[(ApplyScope, &[&str])] = &[
    (ApplyScope::AllProducts, &[]),
    (ApplyScope::Tag, &["bulk"]),
    (ApplyScope::Vendor, &["Acme Mugs"]),
    (ApplyScope::Collection, &["gid://shopify/Collection/100"]),
];

/// Number of variants priced by the sample PRICE discount
const PRICE_VARIANTS: u32 = 3;

/// The seeded VIP customer (id, email)
const VIP_CUSTOMER: (&str, &str) = ("1001", "vip@example.com");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tierline_dev.db");
    let mut shop = String::from("demo.myshopify.com");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--shop" | "-s" => {
                if i + 1 < args.len() {
                    shop = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tierline Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./tierline_dev.db)");
                println!("  -s, --shop <DOMAIN>  Shop domain (default: demo.myshopify.com)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tierline Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Shop:     {}", shop);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.discounts().count_for_shop(&shop).await?;
    if existing > 0 {
        println!("⚠ Shop already has {} discounts", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    db.shops().upsert(&shop, Some(&StorefrontSettings::default())).await?;
    db.customers().upsert(&shop, VIP_CUSTOMER.0, VIP_CUSTOMER.1).await?;
    println!("✓ Shop and VIP customer saved");

    let mut seeded = 0;
    for config in sample_discounts() {
        if let Err(e) = db.discounts().upsert(&shop, &config).await {
            eprintln!("Failed to insert {}: {}", config.id, e);
            continue;
        }
        seeded += 1;
    }

    let active = db.discounts().list_active_for_shop(&shop).await?;
    println!("✓ Seeded {} discounts ({} active)", seeded, active.len());
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn percent(threshold: u32, value: i64) -> QuantityTier {
    QuantityTier {
        threshold_quantity: threshold,
        adjustment: Adjustment::Percentage {
            value: Decimal::new(value, 0),
        },
    }
}

fn discount(title: String, rules: DiscountRules) -> DiscountConfiguration {
    DiscountConfiguration {
        id: format!("seed-{}", Uuid::new_v4()),
        title,
        message: None,
        rules,
        customer_eligibility: CustomerEligibility::Everyone,
        window: ActiveWindow {
            starts_at: Utc::now() - Duration::days(1),
            ends_at: None,
        },
        status: DiscountStatus::Active,
    }
}

/// Builds the sample configurations.
fn sample_discounts() -> Vec<DiscountConfiguration> {
    let mut configs: Vec<DiscountConfiguration> = SCOPES
        .iter()
        .map(|(scope, targets)| {
            discount(
                format!("{:?} volume discount", scope),
                DiscountRules::Quantity {
                    apply_scope: *scope,
                    scope_targets: targets.iter().map(|t| t.to_string()).collect(),
                    exclude_tags: ["final-sale".to_string()].into_iter().collect(),
                    tiers: vec![percent(2, 5), percent(4, 10), percent(8, 15)],
                },
            )
        })
        .collect();

    configs.push(discount(
        "Case pricing".to_string(),
        DiscountRules::Price {
            variants: (1..=PRICE_VARIANTS)
                .map(|n| VariantPriceTiers {
                    variant_id: format!("gid://shopify/ProductVariant/{}", 2000 + n),
                    tiers: vec![
                        PriceTier {
                            threshold_quantity: 6,
                            target_unit_price: Money::from_minor(1800),
                        },
                        PriceTier {
                            threshold_quantity: 12,
                            target_unit_price: Money::from_minor(1500),
                        },
                    ],
                })
                .collect(),
        },
    ));

    let mut vip = discount(
        "VIP bulk discount".to_string(),
        DiscountRules::Quantity {
            apply_scope: ApplyScope::AllProducts,
            scope_targets: Default::default(),
            exclude_tags: Default::default(),
            tiers: vec![percent(3, 20)],
        },
    );
    vip.customer_eligibility = CustomerEligibility::CustomerList {
        emails: [VIP_CUSTOMER.1.to_string()].into_iter().collect(),
    };
    configs.push(vip);

    let mut scheduled = discount(
        "Next week's sale".to_string(),
        DiscountRules::Quantity {
            apply_scope: ApplyScope::AllProducts,
            scope_targets: Default::default(),
            exclude_tags: Default::default(),
            tiers: vec![percent(2, 25)],
        },
    );
    scheduled.window.starts_at = Utc::now() + Duration::days(7);
    scheduled.status = DiscountStatus::Scheduled;
    configs.push(scheduled);

    configs
}
