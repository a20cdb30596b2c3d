//! Seed the storefront catalog and the demo account.
//!
//! Reads products from a YAML list (the bundled `seed/catalog.yaml` unless a
//! file is given), validates them, writes them to the catalog and makes sure
//! the `demo` / `demo123` account exists.

use std::path::Path;

use rust_decimal::Decimal;
use tracing::{error, info};

use shopfront_core::{CurrencyCode, Username};
use shopfront_storefront::db::{PgCatalog, PgUserStore, UserStore};
use shopfront_storefront::models::NewProduct;

use super::connect;
use super::user::create_account;

const BUNDLED_CATALOG: &str = include_str!("../../seed/catalog.yaml");

const DEMO_USERNAME: &str = "demo";
const DEMO_PASSWORD: &str = "demo123";

/// Seed the catalog from `file_path`, or from the bundled catalog.
///
/// # Arguments
///
/// * `file_path` - Optional path to a YAML product list
/// * `keep_existing` - If true, append instead of replacing the catalog
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a product fails
/// validation, or a database operation fails.
pub async fn catalog(
    file_path: Option<&str>,
    keep_existing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = match file_path {
        Some(file_path) => {
            let path = Path::new(file_path);
            if !path.exists() {
                return Err(format!("File not found: {file_path}").into());
            }
            info!(path = %file_path, "Loading catalog from file");
            tokio::fs::read_to_string(path).await?
        }
        None => {
            info!("Loading bundled catalog");
            BUNDLED_CATALOG.to_string()
        }
    };

    // Read and validate YAML before connecting to database
    let products: Vec<NewProduct> = serde_yaml::from_str(&content)?;
    info!(products = products.len(), "Parsed catalog");

    let errors = validate_catalog(&products);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let currency = std::env::var("STOREFRONT_CURRENCY")
        .ok()
        .map_or(Ok(CurrencyCode::USD), |code| code.parse::<CurrencyCode>())?;

    let pool = connect().await?;
    let catalog = PgCatalog::new(pool.clone(), currency);

    let inserted = if keep_existing {
        catalog.insert_all(&products).await?
    } else {
        catalog.replace_all(&products).await?
    };
    info!(inserted, keep_existing, currency = currency.code(), "Catalog seeded");

    let users = PgUserStore::new(pool);
    let demo = Username::parse(DEMO_USERNAME)?;
    if users.find_credentials(&demo).await?.is_some() {
        info!(username = DEMO_USERNAME, "Demo account already exists");
    } else {
        create_account(&users, &demo, DEMO_PASSWORD).await?;
        info!(
            username = DEMO_USERNAME,
            password = DEMO_PASSWORD,
            "Demo account created"
        );
    }

    info!("Seeding complete!");
    Ok(())
}

/// Check every product and collect the problems found.
fn validate_catalog(products: &[NewProduct]) -> Vec<String> {
    let mut errors = Vec::new();

    if products.is_empty() {
        errors.push("catalog is empty".to_string());
    }

    for (index, product) in products.iter().enumerate() {
        let position = index + 1;
        if product.name.trim().is_empty() {
            errors.push(format!("product #{position}: name is empty"));
        }
        if product.price < Decimal::ZERO {
            errors.push(format!(
                "product #{position} ({}): price {} is negative",
                product.name, product.price
            ));
        }
        if product.price.scale() > 2 {
            errors.push(format!(
                "product #{position} ({}): price {} has more than two decimal places",
                product.name, product.price
            ));
        }
    }

    errors
}
