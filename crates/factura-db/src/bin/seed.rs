//! # Seed Data Generator
//!
//! Populates the database with development data: a few factories with their
//! product catalogs, a handful of customers, and one invoice per factory so
//! the numbering and totals paths have real rows to show.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file (./factura.db)
//! cargo run -p factura-db --bin seed
//!
//! # Specify a database path
//! cargo run -p factura-db --bin seed -- --db ./data/factura.db
//! ```

use std::env;
use std::process::ExitCode;

use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use factura_core::{CustomerInput, FactoryInput, InvoiceDraft, Money, ProductInput};
use factura_db::{Database, DbConfig, DbResult};

/// Factories with (name, gstin, phone, code) plus a product catalog of
/// (name, sku, decimal price).
const FACTORIES: &[(&str, &str, &str, &str, &[(&str, &str, &str)])] = &[
    (
        "Adhunik Textiles",
        "23AACCA1234F1Z5",
        "9876543210",
        "ADH",
        &[
            ("Cotton Fabric Roll", "CFR-10", "9.99"),
            ("Silk Blend Sheet", "SBS-04", "24.50"),
            ("Denim Bolt", "DNB-02", "18.00"),
        ],
    ),
    (
        "Prakash Metal Works",
        "27AABCP9876K1Z2",
        "9123456780",
        "PMW",
        &[
            ("Steel Hinge Set", "SHS-12", "5.00"),
            ("Brass Fitting", "BRF-07", "3.25"),
            ("Aluminium Sheet", "ALS-01", "12.75"),
        ],
    ),
];

/// Customers as (name, gstin, phone, email, city).
const CUSTOMERS: &[(&str, &str, &str, &str, &str)] = &[
    (
        "Sharma Traders",
        "23AABCS5678G1Z9",
        "9898989898",
        "accounts@sharmatraders.in",
        "14 MG Road, Indore",
    ),
    (
        "Verma & Sons",
        "27AADCV4321H1Z4",
        "9765432109",
        "billing@vermasons.in",
        "221 Link Road, Mumbai",
    ),
    (
        "Gupta Distributors",
        "09AAFCG8765J1Z1",
        "9654321098",
        "office@guptadist.in",
        "7 Civil Lines, Kanpur",
    ),
];

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let db_path = parse_db_path();
    info!(path = %db_path, "Seeding database");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(err) => {
            error!(error = %err, "Failed to open database");
            return ExitCode::FAILURE;
        }
    };

    let result = seed(&db).await;
    db.close().await;

    match result {
        Ok(()) => {
            info!("Seed complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "Seed failed");
            ExitCode::FAILURE
        }
    }
}

/// Reads `--db <path>` from the command line, defaulting to `./factura.db`.
fn parse_db_path() -> String {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| "./factura.db".to_string())
}

async fn seed(db: &Database) -> DbResult<()> {
    let mut customer_ids = Vec::new();
    for (name, gstin, phone, email, address) in CUSTOMERS {
        let customer = db
            .customers()
            .create(CustomerInput {
                name: name.to_string(),
                gstin: gstin.to_string(),
                phone: phone.to_string(),
                email: Some(email.to_string()),
                address: Some(address.to_string()),
                company: None,
                notes: None,
            })
            .await?;
        info!(id = %customer.id, name = %customer.name, "Seeded customer");
        customer_ids.push(customer.id);
    }

    let today = Utc::now().date_naive();

    for (index, (name, gstin, phone, code, catalog)) in FACTORIES.iter().enumerate() {
        let factory = db
            .factories()
            .create(FactoryInput {
                name: name.to_string(),
                gstin: gstin.to_string(),
                phone: phone.to_string(),
                email: None,
                address: None,
                code: Some(code.to_string()),
            })
            .await?;
        info!(id = %factory.id, code = %code, "Seeded factory");

        let mut products = Vec::new();
        for (product_name, sku, price) in *catalog {
            let price: Money = price.parse().map_err(|_| {
                factura_db::DbError::Internal(format!("bad seed price for {product_name}"))
            })?;
            let product = db
                .products()
                .create(ProductInput {
                    factory_id: factory.id.clone(),
                    name: product_name.to_string(),
                    sku: Some(sku.to_string()),
                    description: None,
                    price_cents: price.cents(),
                    in_stock: true,
                })
                .await?;
            products.push(product);
        }
        info!(factory = %factory.name, count = products.len(), "Seeded products");

        // One invoice per factory so lists and numbering have real data.
        let customer_id = &customer_ids[index % customer_ids.len()];
        let mut draft = InvoiceDraft::new(customer_id.clone(), factory.id.clone(), today);
        draft.add_item(&products[0], 2)?;
        draft.add_item(&products[1], 1)?;
        draft.notes = Some("Seeded invoice".to_string());

        let invoice = db.invoices().create(&draft).await?;
        info!(
            number = %invoice.invoice_number,
            total = %invoice.total(),
            "Seeded invoice"
        );
    }

    Ok(())
}
