//! Integration tests for invoice editing and queries.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use stockbook_core::invoice::{
    InvoiceError, InvoiceStatus, InvoiceType, InvoiceUpdate, NewInvoice,
};
use stockbook_db::memory_service;
use stockbook_shared::LedgerConfig;
use stockbook_shared::types::{ClientVendorId, CompanyId, InvoiceLineId, ProductId};

use common::{date, invoice, invoice_on, line, product, purchase, service};

// ============================================================================
// Test: Create and find
// ============================================================================
#[test]
fn test_create_awaits_approval() {
    let service = service();
    let company_id = CompanyId::new();
    let vendor = ClientVendorId::new();

    let created = service
        .create(
            company_id,
            InvoiceType::Purchase,
            NewInvoice {
                date: date(2024, 4, 2),
                client_vendor_id: Some(vendor),
            },
        )
        .unwrap();

    assert_eq!(created.status, InvoiceStatus::AwaitingApproval);
    assert_eq!(created.company_id, company_id);
    assert_eq!(created.client_vendor_id, Some(vendor));
    assert!(!created.is_deleted);

    let found = service.find_by_id(company_id, created.id).unwrap();
    assert_eq!(found.invoice, created);
    assert!(found.lines.is_empty());
    assert_eq!(found.totals.total, dec!(0));
}

#[test]
fn test_find_by_id_computes_totals() {
    let service = service();
    let company_id = CompanyId::new();
    let widget = product(&service, company_id, 0);
    let p1 = invoice(&service, company_id, InvoiceType::Purchase);
    service
        .add_line(company_id, p1.id, line(&widget, 3, dec!(100.00), 10))
        .unwrap();
    service
        .add_line(company_id, p1.id, line(&widget, 2, dec!(9.99), 7))
        .unwrap();

    let totals = service.find_by_id(company_id, p1.id).unwrap().totals;

    assert_eq!(totals.price, dec!(319.98));
    assert_eq!(totals.tax, dec!(31.40));
    assert_eq!(totals.total, dec!(351.38));
}

#[test]
fn test_find_by_id_hides_other_companies() {
    let service = service();
    let p1 = invoice(&service, CompanyId::new(), InvoiceType::Purchase);

    let result = service.find_by_id(CompanyId::new(), p1.id);

    assert!(matches!(result, Err(InvoiceError::InvoiceNotFound(_))));
}

// ============================================================================
// Test: Line management
// ============================================================================
#[test]
fn test_add_line_rejects_invalid_input() {
    let service = service();
    let company_id = CompanyId::new();
    let widget = product(&service, company_id, 0);
    let p1 = invoice(&service, company_id, InvoiceType::Purchase);

    for input in [
        line(&widget, 0, dec!(1.00), 10),
        line(&widget, 1, dec!(-1.00), 10),
        line(&widget, 1, dec!(1.00), 101),
    ] {
        assert!(matches!(
            service.add_line(company_id, p1.id, input),
            Err(InvoiceError::Validation(_))
        ));
    }
    assert!(service.find_by_id(company_id, p1.id).unwrap().lines.is_empty());
}

#[test]
fn test_add_line_rejects_price_too_large_to_total() {
    let service = service();
    let company_id = CompanyId::new();
    let widget = product(&service, company_id, 0);
    let p1 = invoice(&service, company_id, InvoiceType::Purchase);

    let result = service.add_line(company_id, p1.id, line(&widget, 2, Decimal::MAX, 0));

    assert!(matches!(result, Err(InvoiceError::Validation(_))));
    let found = service.find_by_id(company_id, p1.id).unwrap();
    assert!(found.lines.is_empty());
    assert_eq!(service.list(company_id, InvoiceType::Purchase).unwrap().len(), 1);
}

#[test]
fn test_add_line_requires_product_in_company() {
    let service = service();
    let company_id = CompanyId::new();
    let foreign = product(&service, CompanyId::new(), 10);
    let p1 = invoice(&service, company_id, InvoiceType::Purchase);

    let result = service.add_line(company_id, p1.id, line(&foreign, 1, dec!(1.00), 0));
    assert!(matches!(result, Err(InvoiceError::ProductNotFound(id)) if id == foreign.id));

    let mut unknown = line(&foreign, 1, dec!(1.00), 0);
    unknown.product_id = ProductId::new();
    assert!(matches!(
        service.add_line(company_id, p1.id, unknown),
        Err(InvoiceError::ProductNotFound(_))
    ));
}

#[test]
fn test_remove_line_is_soft() {
    let service = service();
    let company_id = CompanyId::new();
    let widget = product(&service, company_id, 0);
    let p1 = invoice(&service, company_id, InvoiceType::Purchase);
    let kept = service
        .add_line(company_id, p1.id, line(&widget, 1, dec!(1.00), 0))
        .unwrap();
    let removed = service
        .add_line(company_id, p1.id, line(&widget, 2, dec!(1.00), 0))
        .unwrap();

    service.remove_line(company_id, p1.id, removed.id).unwrap();

    let lines = service.find_by_id(company_id, p1.id).unwrap().lines;
    assert_eq!(lines, vec![kept]);
    assert!(service.store().line(removed.id).unwrap().unwrap().is_deleted);

    assert!(matches!(
        service.remove_line(company_id, p1.id, removed.id),
        Err(InvoiceError::LineNotFound(_))
    ));
}

#[test]
fn test_remove_line_must_belong_to_invoice() {
    let service = service();
    let company_id = CompanyId::new();
    let widget = product(&service, company_id, 0);
    let p1 = invoice(&service, company_id, InvoiceType::Purchase);
    let p2 = invoice(&service, company_id, InvoiceType::Purchase);
    let other = service
        .add_line(company_id, p2.id, line(&widget, 1, dec!(1.00), 0))
        .unwrap();

    assert!(matches!(
        service.remove_line(company_id, p1.id, other.id),
        Err(InvoiceError::LineNotFound(id)) if id == other.id
    ));
    assert!(matches!(
        service.remove_line(company_id, p1.id, InvoiceLineId::new()),
        Err(InvoiceError::LineNotFound(_))
    ));
}

// ============================================================================
// Test: Update and delete
// ============================================================================
#[test]
fn test_update_only_changes_client_vendor() {
    let service = service();
    let company_id = CompanyId::new();
    let created = invoice(&service, company_id, InvoiceType::Sales);
    let client = ClientVendorId::new();

    let updated = service
        .update(
            company_id,
            created.id,
            InvoiceUpdate {
                client_vendor_id: Some(client),
            },
        )
        .unwrap();

    assert_eq!(updated.client_vendor_id, Some(client));
    assert_eq!(updated.invoice_no, created.invoice_no);
    assert_eq!(updated.status, created.status);
    assert_eq!(updated.invoice_type, created.invoice_type);
    assert_eq!(updated.date, created.date);
    assert_eq!(updated.company_id, created.company_id);
    assert_eq!(service.find_by_id(company_id, created.id).unwrap().invoice, updated);
}

#[test]
fn test_delete_soft_deletes_invoice_and_lines() {
    let service = service();
    let company_id = CompanyId::new();
    let widget = product(&service, company_id, 0);
    let p1 = invoice(&service, company_id, InvoiceType::Purchase);
    let added = service
        .add_line(company_id, p1.id, line(&widget, 1, dec!(1.00), 0))
        .unwrap();

    service.delete(company_id, p1.id).unwrap();

    assert!(matches!(
        service.find_by_id(company_id, p1.id),
        Err(InvoiceError::InvoiceNotFound(_))
    ));
    assert!(service.store().line(added.id).unwrap().unwrap().is_deleted);
    assert!(matches!(
        service.delete(company_id, p1.id),
        Err(InvoiceError::InvoiceNotFound(_))
    ));
}

// ============================================================================
// Test: Queries
// ============================================================================
#[test]
fn test_list_is_number_descending_without_deleted() {
    let service = service();
    let company_id = CompanyId::new();
    let s1 = invoice(&service, company_id, InvoiceType::Sales);
    let s2 = invoice(&service, company_id, InvoiceType::Sales);
    let s3 = invoice(&service, company_id, InvoiceType::Sales);
    invoice(&service, company_id, InvoiceType::Purchase);
    service.delete(company_id, s2.id).unwrap();

    let numbers: Vec<String> = service
        .list(company_id, InvoiceType::Sales)
        .unwrap()
        .into_iter()
        .map(|summary| summary.invoice.invoice_no)
        .collect();

    assert_eq!(numbers, vec![s3.invoice_no, s1.invoice_no]);
}

#[test]
fn test_recent_approved_is_date_descending_and_limited() {
    let service = service();
    let company_id = CompanyId::new();
    let widget = product(&service, company_id, 0);

    let jan = purchase(&service, company_id, &widget, date(2024, 1, 10), 1, dec!(1.00), 0);
    let mar = purchase(&service, company_id, &widget, date(2024, 3, 10), 1, dec!(1.00), 0);
    let feb = purchase(&service, company_id, &widget, date(2024, 2, 10), 1, dec!(1.00), 0);
    let apr = purchase(&service, company_id, &widget, date(2024, 4, 10), 1, dec!(1.00), 0);
    // Newest date but never approved.
    invoice_on(&service, company_id, InvoiceType::Sales, date(2024, 12, 1));
    // Approved but deleted.
    let deleted = purchase(&service, company_id, &widget, date(2024, 11, 1), 1, dec!(1.00), 0);
    service.delete(company_id, deleted.id).unwrap();

    let ids: Vec<_> = service
        .recent_approved(company_id)
        .unwrap()
        .into_iter()
        .map(|summary| summary.invoice.id)
        .collect();

    assert_eq!(ids, vec![apr.id, mar.id, feb.id]);
    assert!(!ids.contains(&jan.id));
}

#[test]
fn test_recent_approved_limit_is_configurable() {
    let service = memory_service(LedgerConfig {
        recent_approved_limit: 1,
        ..LedgerConfig::default()
    });
    let company_id = CompanyId::new();
    let widget = product(&service, company_id, 0);
    purchase(&service, company_id, &widget, date(2024, 1, 1), 1, dec!(1.00), 0);
    let latest = purchase(&service, company_id, &widget, date(2024, 2, 1), 1, dec!(1.00), 0);

    let recent = service.recent_approved(company_id).unwrap();

    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].invoice.id, latest.id);
}

#[test]
fn test_exists_for_client_vendor() {
    let service = service();
    let company_id = CompanyId::new();
    let client = ClientVendorId::new();
    let created = invoice(&service, company_id, InvoiceType::Sales);

    assert!(!service.exists_for_client_vendor(client).unwrap());

    service
        .update(
            company_id,
            created.id,
            InvoiceUpdate {
                client_vendor_id: Some(client),
            },
        )
        .unwrap();
    assert!(service.exists_for_client_vendor(client).unwrap());

    service.delete(company_id, created.id).unwrap();
    assert!(!service.exists_for_client_vendor(client).unwrap());
}
