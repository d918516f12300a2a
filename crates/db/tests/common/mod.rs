//! Shared fixtures for store-backed service tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;

use stockbook_core::invoice::{
    Invoice, InvoiceService, InvoiceType, NewInvoice, NewInvoiceLine, Product,
};
use stockbook_db::{MemoryStore, memory_service};
use stockbook_shared::LedgerConfig;
use stockbook_shared::types::{CompanyId, ProfitLossMode};

pub type Service = InvoiceService<MemoryStore>;

pub fn service() -> Service {
    memory_service(LedgerConfig::default())
}

pub fn service_with_mode(mode: ProfitLossMode) -> Service {
    memory_service(LedgerConfig {
        profit_loss_mode: mode,
        ..LedgerConfig::default()
    })
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn product(service: &Service, company_id: CompanyId, stock: u32) -> Product {
    service
        .store()
        .insert_product(company_id, "Widget", stock)
        .unwrap()
}

pub fn stock_of(service: &Service, product: &Product) -> u32 {
    service
        .store()
        .product(product.id)
        .unwrap()
        .unwrap()
        .quantity_in_stock
}

pub fn invoice_on(
    service: &Service,
    company_id: CompanyId,
    invoice_type: InvoiceType,
    on: NaiveDate,
) -> Invoice {
    service
        .create(
            company_id,
            invoice_type,
            NewInvoice {
                date: on,
                client_vendor_id: None,
            },
        )
        .unwrap()
}

pub fn invoice(service: &Service, company_id: CompanyId, invoice_type: InvoiceType) -> Invoice {
    invoice_on(service, company_id, invoice_type, date(2024, 3, 1))
}

pub fn line(product: &Product, quantity: u32, price: Decimal, tax: u8) -> NewInvoiceLine {
    NewInvoiceLine {
        product_id: product.id,
        quantity,
        price,
        tax,
    }
}

/// Creates and approves a single-line purchase.
pub fn purchase(
    service: &Service,
    company_id: CompanyId,
    product: &Product,
    on: NaiveDate,
    quantity: u32,
    price: Decimal,
    tax: u8,
) -> Invoice {
    let invoice = invoice_on(service, company_id, InvoiceType::Purchase, on);
    service
        .add_line(company_id, invoice.id, line(product, quantity, price, tax))
        .unwrap();
    service.approve(company_id, invoice.id).unwrap();
    invoice
}
