//! # Seed Data Generator
//!
//! Populates a development database with corporate batches and individual
//! vouchers.
//!
//! ## Usage
//! ```bash
//! # 20 corporate batches (default)
//! cargo run -p greenpay-db --bin seed
//!
//! # Custom amount
//! cargo run -p greenpay-db --bin seed -- --batches 50
//!
//! # Specify database path
//! cargo run -p greenpay-db --bin seed -- --db ./data/greenpay.db
//! ```
//!
//! ## Generated Data
//! - Corporate batches of 5 to 250 vouchers across a fixed company list
//! - One individual voucher per batch, with a synthetic passport number
//! - Every voucher at the standard K50.00 exit fee

use std::env;

use greenpay_core::{BatchRequest, PaymentMethod, VoucherCategory, VoucherRequest};
use greenpay_db::{Database, DbConfig, DEFAULT_MAX_ATTEMPTS};

/// Companies buying corporate batches.
const COMPANIES: &[&str] = &[
    "Air Niugini",
    "Ok Tedi Mining",
    "Oil Search",
    "Bank South Pacific",
    "Digicel PNG",
    "Steamships Trading",
    "Lae Biscuit Company",
    "Ela Motors",
];

/// Passenger names for individual vouchers.
const PASSENGERS: &[&str] = &[
    "Jane Kila",
    "Peter Wari",
    "Mary Aihi",
    "John Tau",
    "Grace Namaliu",
    "Michael Somare",
];

/// Batch sizes cycled through.
const BATCH_SIZES: &[i64] = &[5, 10, 25, 50, 100, 250];

/// Standard exit fee: K50.00
const EXIT_FEE_TOEA: i64 = 5000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut batches: usize = 20;
    let mut db_path = String::from("./greenpay_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--batches" | "-b" => {
                if i + 1 < args.len() {
                    batches = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("GreenPay Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --batches <N>  Number of corporate batches (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./greenpay_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 GreenPay Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Batches:  {}", batches);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.vouchers().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} vouchers", existing);
        println!("  Skipping seed to avoid mixing runs.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Issuing vouchers...");

    let issuer = db.issuer(DEFAULT_MAX_ATTEMPTS);
    let start = std::time::Instant::now();
    let mut issued_vouchers = 0usize;
    let mut first_batch = None;

    for n in 0..batches {
        let request = BatchRequest {
            company_name: COMPANIES[n % COMPANIES.len()].to_string(),
            quantity: BATCH_SIZES[n % BATCH_SIZES.len()],
            amount_toea: EXIT_FEE_TOEA,
            payment_method: if n % 2 == 0 {
                PaymentMethod::BankTransfer
            } else {
                PaymentMethod::Card
            },
            payment_reference: Some(format!("INV-{:05}", n + 1)),
            valid_from: None,
            valid_until: None,
        };

        match issuer.issue_batch(&request).await {
            Ok(issued) => {
                issued_vouchers += issued.vouchers.len();
                first_batch.get_or_insert(issued);
            }
            Err(e) => {
                eprintln!("Failed to issue batch for {}: {}", request.company_name, e);
                continue;
            }
        }

        let passenger = VoucherRequest {
            category: VoucherCategory::Individual,
            amount_toea: EXIT_FEE_TOEA,
            payment_method: PaymentMethod::Cash,
            payment_reference: Some(format!("RCPT-{:05}", n + 1)),
            company_name: None,
            passport_number: Some(format!("P{:07}", 1_000_000 + n)),
            customer_name: Some(PASSENGERS[n % PASSENGERS.len()].to_string()),
            valid_from: None,
            valid_until: None,
        };

        match issuer.issue_voucher(&passenger).await {
            Ok(_) => issued_vouchers += 1,
            Err(e) => eprintln!("Failed to issue individual voucher: {}", e),
        }

        if (n + 1) % 5 == 0 {
            println!("  Issued {} batches...", n + 1);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Issued {} vouchers in {:?}", issued_vouchers, elapsed);
    println!(
        "  Rate: {:.0} vouchers/second",
        issued_vouchers as f64 / elapsed.as_secs_f64()
    );

    if let Some(issued) = first_batch {
        println!();
        println!("Sample batch:");
        println!("{}", serde_json::to_string_pretty(&issued)?);

        if let Some(first) = issued.vouchers.first() {
            let redeemed = db.vouchers().redeem(&first.code).await?;
            println!("✓ Redeemed {} to exercise the gate flow", redeemed.code);
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
