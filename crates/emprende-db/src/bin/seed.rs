//! # Seed Data Generator
//!
//! Populates the database with a small demo catalog and some history.
//!
//! ## Usage
//! ```bash
//! cargo run -p emprende-db --bin seed
//!
//! # Specify database path and merchant
//! cargo run -p emprende-db --bin seed -- --db ./data/emprende.db --merchant <uuid>
//! ```

use std::env;

use emprende_core::{NewProduct, NewTransaction, DEFAULT_MERCHANT_ID};
use emprende_db::{Database, DbConfig};

/// (name, price, cost, stock)
const CATALOG: &[(&str, i64, i64, i64)] = &[
    ("Pulsera", 1500, 600, 20),
    ("Pulsera Dubai", 3500, 1400, 6),
    ("Anillo de plata", 8000, 3500, 4),
    ("Aros", 2500, 900, 12),
    ("Macizo de chocolate", 800, 350, 30),
    ("Dubai", 1500, 700, 2),
    ("Latas de bebida", 900, 500, 24),
    ("Pan amasado", 200, 80, 0),
];

/// (amount, description)
const EXPENSES: &[(i64, &str)] = &[
    (25000, "Arriendo"),
    (8000, "Insumos"),
    (3500, "Luz"),
    (6000, "Insumos"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = "./emprende_dev.db".to_string();
    let mut merchant_id = DEFAULT_MERCHANT_ID.to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--merchant" | "-m" => {
                if i + 1 < args.len() {
                    merchant_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Emprende Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./emprende_dev.db)");
                println!("  -m, --merchant <ID>      Merchant id (default: {})", DEFAULT_MERCHANT_ID);
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Emprende Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Merchant: {}", merchant_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count(&merchant_id).await?;
    if existing > 0 {
        println!("⚠ Merchant already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut products = Vec::with_capacity(CATALOG.len());
    for (name, price, cost, stock) in CATALOG {
        let mut new = NewProduct::new(*name, *price, *stock);
        new.cost = Some(*cost);
        products.push(db.products().insert(&merchant_id, &new).await?);
    }
    println!("✓ Created {} products", products.len());

    // A few sales so the insights have something to show
    let mut sales = 0;
    for product in products.iter().filter(|p| p.stock > 3) {
        let mut uow = db.begin().await?;
        uow.decrement_stock(&merchant_id, &product.id, 2).await?;
        uow.record(&merchant_id, &NewTransaction::quantity_sale(product, 2, None)?)
            .await?;
        uow.commit().await?;
        sales += 1;
    }
    println!("✓ Recorded {} sales", sales);

    for (amount, description) in EXPENSES {
        db.transactions()
            .insert(&merchant_id, &NewTransaction::expense(*amount, *description))
            .await?;
    }
    println!("✓ Recorded {} expenses", EXPENSES.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
