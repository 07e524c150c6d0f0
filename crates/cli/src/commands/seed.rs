//! Demo catalog seeding.
//!
//! Inserts a handful of products, skipping any whose name already exists, so
//! the command can be re-run safely.

use rust_decimal::Decimal;

use shopdesk_core::{Price, Stock};
use shopdesk_server::db::ProductRepository;
use shopdesk_server::models::{CreateProductInput, ValidationError};

use super::{CliError, connect};

/// `(name, description, price in cents, stock)`
const DEMO_PRODUCTS: &[(&str, &str, i64, i32)] = &[
    ("Desk Lamp", "Adjustable LED desk lamp with warm light", 2_990, 25),
    ("Notebook A5", "Dotted notebook, 160 pages", 650, 120),
    ("Fountain Pen", "Steel nib, medium", 4_500, 8),
    ("Coffee Mug", "Stoneware, 350 ml", 1_200, 40),
    ("Monitor Stand", "Bamboo riser with drawer", 3_950, 0),
];

fn demo_inputs() -> Result<Vec<CreateProductInput>, CliError> {
    DEMO_PRODUCTS
        .iter()
        .map(|&(name, description, cents, stock)| {
            let price = Price::new(Decimal::new(cents, 2))
                .map_err(|e| ValidationError::new(format!("{name}: {e}")))?;
            let stock_quantity =
                Stock::new(stock).map_err(|e| ValidationError::new(format!("{name}: {e}")))?;
            Ok(CreateProductInput {
                name: name.to_owned(),
                description: Some(description.to_owned()),
                price,
                stock_quantity,
            })
        })
        .collect()
}

/// Insert the demo catalog.
pub async fn run() -> Result<(), CliError> {
    let products = demo_inputs()?;
    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let mut inserted = 0;
    for product in &products {
        if repo.create_if_missing(product).await? {
            inserted += 1;
        }
    }

    tracing::info!("Seeding complete!");
    tracing::info!("  Products inserted: {}", inserted);
    tracing::info!("  Products skipped (already exist): {}", products.len() - inserted);
    Ok(())
}
