//! Development seeder for Stockbook.
//!
//! Seeds a test company with one product, then runs a purchase and a sale
//! through the approval workflow and prints both invoices as JSON.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use stockbook_core::invoice::{InvoiceService, InvoiceType, NewInvoice, NewInvoiceLine};
use stockbook_db::{MemoryStore, memory_service};
use stockbook_shared::types::{CompanyId, InvoiceId, ProductId};
use stockbook_shared::{AppConfig, LoggingConfig};

/// Test company ID (consistent for all seeds)
const TEST_COMPANY_ID: &str = "00000000-0000-0000-0000-000000000001";

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let service = memory_service(config.ledger.clone());
    let company_id: CompanyId = TEST_COMPANY_ID.parse()?;

    info!(
        company_id = %company_id,
        profit_loss_mode = %service.profit_loss_mode(),
        "Seeding test company"
    );
    let product = service
        .store()
        .insert_product(company_id, "Test Widget", 0)?;

    let purchase = seed_invoice(
        &service,
        company_id,
        InvoiceType::Purchase,
        product.id,
        10,
        Decimal::new(5000, 2),
    )?;
    let sale = seed_invoice(
        &service,
        company_id,
        InvoiceType::Sales,
        product.id,
        4,
        Decimal::new(8000, 2),
    )?;

    let purchase = service.approve(company_id, purchase)?;
    let sale = service.approve(company_id, sale)?;

    println!("{}", serde_json::to_string_pretty(&purchase.summary)?);
    println!("{}", serde_json::to_string_pretty(&sale)?);

    let stock = service
        .store()
        .product(product.id)?
        .map_or(0, |product| product.quantity_in_stock);
    info!(product_id = %product.id, stock, "Seeding complete");

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(logging.json.then(|| fmt::layer().json()))
        .with((!logging.json).then(|| fmt::layer()))
        .init();
}

/// Creates an invoice dated today with a single 10% line.
fn seed_invoice(
    service: &InvoiceService<MemoryStore>,
    company_id: CompanyId,
    invoice_type: InvoiceType,
    product_id: ProductId,
    quantity: u32,
    price: Decimal,
) -> anyhow::Result<InvoiceId> {
    let today: NaiveDate = chrono::Local::now().date_naive();

    let invoice = service.create(
        company_id,
        invoice_type,
        NewInvoice {
            date: today,
            client_vendor_id: None,
        },
    )?;
    service.add_line(
        company_id,
        invoice.id,
        NewInvoiceLine {
            product_id,
            quantity,
            price,
            tax: 10,
        },
    )?;

    info!(invoice_no = %invoice.invoice_no, invoice_type = %invoice_type, "Seeded invoice");
    Ok(invoice.id)
}
