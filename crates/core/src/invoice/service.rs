//! Invoice service.
//!
//! Orchestrates numbering, line management and approval over an
//! [`InvoiceStore`]. Every operation runs in one unit of work that holds
//! the locks it needs. Approval and deletion lock the invoice and every
//! product on it, so cost layers of a product are only ever touched by one
//! unit of work at a time.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use stockbook_shared::LedgerConfig;
use stockbook_shared::types::{
    ClientVendorId, CompanyId, InvoiceId, InvoiceLineId, ProductId, ProfitLossMode,
};

use crate::inventory::fifo::{FifoMatcher, MatchOutcome};
use crate::inventory::stock::StockLedger;
use crate::invoice::calculator::InvoiceCalculator;
use crate::invoice::error::InvoiceError;
use crate::invoice::numbering::InvoiceNumbering;
use crate::invoice::store::{InvoiceStore, LockKey, StoreTx};
use crate::invoice::types::{
    Invoice, InvoiceDraft, InvoiceLine, InvoiceStatus, InvoiceSummary, InvoiceType, InvoiceUpdate,
    NewInvoice, NewInvoiceLine,
};
use crate::invoice::workflow::InvoiceWorkflow;

/// How often approval re-reads an invoice whose products changed while
/// its locks were being taken.
pub const MAX_LOCK_ATTEMPTS: u32 = 3;

/// Highest accepted tax rate in percent.
pub const MAX_TAX_RATE: u8 = 100;

/// Highest accepted unit price, in whole currency units.
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000_000;

/// Matching result for one sales line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleMatch {
    /// The sales line.
    pub line_id: InvoiceLineId,
    /// Layers consumed and resulting profit/loss.
    pub outcome: MatchOutcome,
}

/// Result of a successful approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalReceipt {
    /// The approved invoice with its final lines and totals.
    pub summary: InvoiceSummary,
    /// One entry per sales line; empty for purchases.
    pub matches: Vec<SaleMatch>,
}

/// Invoice operations over a store.
#[derive(Debug, Clone)]
pub struct InvoiceService<S> {
    store: S,
    config: LedgerConfig,
}

impl<S: InvoiceStore> InvoiceService<S> {
    /// Creates a new invoice service.
    #[must_use]
    pub const fn new(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the configured profit/loss mode.
    #[must_use]
    pub const fn profit_loss_mode(&self) -> ProfitLossMode {
        self.config.profit_loss_mode
    }

    /// Proposes the next invoice of a type without saving anything.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvalidState` if the stored latest number is malformed.
    pub fn generate(
        &self,
        company_id: CompanyId,
        invoice_type: InvoiceType,
        today: NaiveDate,
    ) -> Result<InvoiceDraft, InvoiceError> {
        let tx = self
            .store
            .begin(&[LockKey::Numbering(company_id, invoice_type)])?;
        let latest = tx.latest_invoice_number(company_id, invoice_type)?;
        let invoice_no = InvoiceNumbering::next(latest.as_deref(), invoice_type)?;

        Ok(InvoiceDraft {
            invoice_no,
            date: today,
            invoice_type,
        })
    }

    /// Creates a numbered invoice awaiting approval.
    ///
    /// The number is read and taken under the company/type numbering lock.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvalidState` if the stored latest number is malformed.
    pub fn create(
        &self,
        company_id: CompanyId,
        invoice_type: InvoiceType,
        input: NewInvoice,
    ) -> Result<Invoice, InvoiceError> {
        let mut tx = self
            .store
            .begin(&[LockKey::Numbering(company_id, invoice_type)])?;
        let latest = tx.latest_invoice_number(company_id, invoice_type)?;
        let invoice_no = InvoiceNumbering::next(latest.as_deref(), invoice_type)?;

        let invoice = Invoice {
            id: InvoiceId::new(),
            invoice_no,
            status: InvoiceStatus::AwaitingApproval,
            invoice_type,
            date: input.date,
            company_id,
            client_vendor_id: input.client_vendor_id,
            is_deleted: false,
        };

        tx.save_invoice(invoice.clone())?;
        tx.commit()?;

        info!(
            invoice_id = %invoice.id,
            invoice_no = %invoice.invoice_no,
            invoice_type = %invoice.invoice_type,
            company_id = %company_id,
            "invoice created"
        );

        Ok(invoice)
    }

    /// Adds a line to an invoice awaiting approval.
    ///
    /// # Errors
    ///
    /// Returns error if the input is invalid, the invoice or product is not
    /// found in the company, or the invoice is approved.
    pub fn add_line(
        &self,
        company_id: CompanyId,
        invoice_id: InvoiceId,
        input: NewInvoiceLine,
    ) -> Result<InvoiceLine, InvoiceError> {
        validate_new_line(&input)?;

        let mut tx = self.store.begin(&[LockKey::Invoice(invoice_id)])?;
        let invoice = owned_invoice(&tx, company_id, invoice_id)?;
        InvoiceWorkflow::validate_can_modify(&invoice)?;

        if tx.product(company_id, input.product_id)?.is_none() {
            return Err(InvoiceError::ProductNotFound(input.product_id));
        }

        let line = InvoiceLine::new(
            invoice_id,
            input.product_id,
            input.quantity,
            input.price,
            input.tax,
        );
        tx.save_line(line.clone())?;
        tx.commit()?;

        debug!(invoice_id = %invoice_id, line_id = %line.id, "invoice line added");

        Ok(line)
    }

    /// Soft-removes a line from an invoice awaiting approval.
    ///
    /// # Errors
    ///
    /// Returns error if the invoice or line is not found or the invoice is approved.
    pub fn remove_line(
        &self,
        company_id: CompanyId,
        invoice_id: InvoiceId,
        line_id: InvoiceLineId,
    ) -> Result<(), InvoiceError> {
        let mut tx = self.store.begin(&[LockKey::Invoice(invoice_id)])?;
        let invoice = owned_invoice(&tx, company_id, invoice_id)?;
        InvoiceWorkflow::validate_can_modify(&invoice)?;

        let mut line = tx
            .line(line_id)?
            .filter(|line| line.invoice_id == invoice_id && !line.is_deleted)
            .ok_or(InvoiceError::LineNotFound(line_id))?;
        line.is_deleted = true;

        tx.save_line(line)?;
        tx.commit()?;

        debug!(invoice_id = %invoice_id, line_id = %line_id, "invoice line removed");

        Ok(())
    }

    /// Updates the editable fields of an invoice.
    ///
    /// Number, status, type, date and company always keep their stored values.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvoiceNotFound` if the invoice is not visible to the company.
    pub fn update(
        &self,
        company_id: CompanyId,
        invoice_id: InvoiceId,
        changes: InvoiceUpdate,
    ) -> Result<Invoice, InvoiceError> {
        let mut tx = self.store.begin(&[LockKey::Invoice(invoice_id)])?;
        let mut invoice = owned_invoice(&tx, company_id, invoice_id)?;
        invoice.client_vendor_id = changes.client_vendor_id;

        tx.save_invoice(invoice.clone())?;
        tx.commit()?;

        Ok(invoice)
    }

    /// Soft-deletes an invoice together with its lines.
    ///
    /// Locks the invoice and its products, so a delete never interleaves
    /// with a sale consuming the invoice's cost layers.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvoiceNotFound` if the invoice is not visible to the company.
    pub fn delete(&self, company_id: CompanyId, invoice_id: InvoiceId) -> Result<(), InvoiceError> {
        let (mut tx, mut invoice, lines) = self.lock_with_products(company_id, invoice_id)?;

        let line_count = lines.len();
        for mut line in lines {
            line.is_deleted = true;
            tx.save_line(line)?;
        }

        invoice.is_deleted = true;
        tx.save_invoice(invoice)?;
        tx.commit()?;

        info!(invoice_id = %invoice_id, company_id = %company_id, line_count, "invoice deleted");

        Ok(())
    }

    /// Loads an invoice with its lines and totals.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvoiceNotFound` if the invoice is not visible to the company.
    pub fn find_by_id(
        &self,
        company_id: CompanyId,
        invoice_id: InvoiceId,
    ) -> Result<InvoiceSummary, InvoiceError> {
        let tx = self.store.begin(&[])?;
        let invoice = owned_invoice(&tx, company_id, invoice_id)?;
        summarize(&tx, invoice)
    }

    /// Non-deleted invoices of a type, highest number first.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or a total cannot be computed.
    pub fn list(
        &self,
        company_id: CompanyId,
        invoice_type: InvoiceType,
    ) -> Result<Vec<InvoiceSummary>, InvoiceError> {
        let tx = self.store.begin(&[])?;
        let mut invoices: Vec<Invoice> = tx
            .invoices(company_id, Some(invoice_type))?
            .into_iter()
            .filter(|invoice| !invoice.is_deleted)
            .collect();
        invoices.sort_by(|a, b| InvoiceNumbering::compare(&b.invoice_no, &a.invoice_no));

        invoices
            .into_iter()
            .map(|invoice| summarize(&tx, invoice))
            .collect()
    }

    /// The most recently dated approved invoices of any type.
    ///
    /// Returns at most `ledger.recent_approved_limit` entries.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or a total cannot be computed.
    pub fn recent_approved(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<InvoiceSummary>, InvoiceError> {
        let tx = self.store.begin(&[])?;
        let mut invoices: Vec<Invoice> = tx
            .invoices(company_id, None)?
            .into_iter()
            .filter(|invoice| !invoice.is_deleted && invoice.status == InvoiceStatus::Approved)
            .collect();
        // Later inserts win ties on the same date.
        invoices.reverse();
        invoices.sort_by(|a, b| b.date.cmp(&a.date));
        invoices.truncate(self.config.recent_approved_limit);

        invoices
            .into_iter()
            .map(|invoice| summarize(&tx, invoice))
            .collect()
    }

    /// Returns true if any live invoice references the client or vendor.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Store` if the store fails.
    pub fn exists_for_client_vendor(
        &self,
        client_vendor_id: ClientVendorId,
    ) -> Result<bool, InvoiceError> {
        let tx = self.store.begin(&[])?;
        tx.client_vendor_in_use(client_vendor_id)
    }

    /// Approves an invoice.
    ///
    /// Sales invoices are checked line by line against stock first. The
    /// first short line is removed from the invoice (and that removal is
    /// kept) before `InsufficientStock` is returned; nothing else changes.
    /// Otherwise every sales line is matched against the product's cost
    /// layers and stock is decreased. Purchase lines open cost layers and
    /// increase stock. All of it commits together with the status change.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The invoice is not found, deleted or owned by another company
    /// - The invoice is already approved
    /// - A sales line exceeds the product's stock
    /// - The store fails or the invoice keeps changing while being locked
    pub fn approve(
        &self,
        company_id: CompanyId,
        invoice_id: InvoiceId,
    ) -> Result<ApprovalReceipt, InvoiceError> {
        let (tx, invoice, lines) = self.lock_with_products(company_id, invoice_id)?;
        self.approve_locked(tx, invoice, lines)
    }

    /// Begins a unit of work holding the invoice lock and a lock on every
    /// product its live lines reference, then loads the invoice and lines.
    fn lock_with_products(
        &self,
        company_id: CompanyId,
        invoice_id: InvoiceId,
    ) -> Result<(S::Tx<'_>, Invoice, Vec<InvoiceLine>), InvoiceError> {
        for attempt in 1..=MAX_LOCK_ATTEMPTS {
            let products = self.peek_products(invoice_id)?;

            let mut keys = vec![LockKey::Invoice(invoice_id)];
            keys.extend(
                products
                    .iter()
                    .map(|&product_id| LockKey::Product(company_id, product_id)),
            );

            let tx = self.store.begin(&keys)?;
            let invoice = owned_invoice(&tx, company_id, invoice_id)?;
            let lines = tx.lines(invoice_id)?;

            if lines.iter().any(|line| !products.contains(&line.product_id)) {
                debug!(invoice_id = %invoice_id, attempt, "invoice lines changed while locking");
                continue;
            }

            return Ok((tx, invoice, lines));
        }

        Err(InvoiceError::Store(format!(
            "invoice {invoice_id} kept changing after {MAX_LOCK_ATTEMPTS} lock attempts"
        )))
    }

    /// Products referenced by an invoice, read without locks.
    fn peek_products(&self, invoice_id: InvoiceId) -> Result<HashSet<ProductId>, InvoiceError> {
        let tx = self.store.begin(&[])?;
        Ok(tx
            .lines(invoice_id)?
            .into_iter()
            .map(|line| line.product_id)
            .collect())
    }

    fn approve_locked<T: StoreTx>(
        &self,
        mut tx: T,
        mut invoice: Invoice,
        lines: Vec<InvoiceLine>,
    ) -> Result<ApprovalReceipt, InvoiceError> {
        let next_status = InvoiceWorkflow::approve(&invoice)?;
        let mut matches = Vec::new();

        match invoice.invoice_type {
            InvoiceType::Sales => {
                if let Some(shortage) = find_shortage(&tx, invoice.company_id, &lines)? {
                    let (mut line, err) = shortage;
                    warn!(
                        invoice_id = %invoice.id,
                        line_id = %line.id,
                        product_id = %line.product_id,
                        error = %err,
                        "removing line without enough stock"
                    );
                    line.is_deleted = true;
                    tx.save_line(line)?;
                    tx.commit()?;
                    return Err(err);
                }

                for line in lines {
                    let sale = self.match_sale_line(&mut tx, invoice.company_id, line, &mut matches)?;
                    StockLedger::decrease(&mut tx, sale.product_id, sale.quantity)?;
                    tx.save_line(sale)?;
                }
            }
            InvoiceType::Purchase => {
                for mut line in lines {
                    FifoMatcher::open_layer(&mut line);
                    StockLedger::increase(&mut tx, line.product_id, line.quantity)?;
                    tx.save_line(line)?;
                }
            }
        }

        invoice.status = next_status;
        tx.save_invoice(invoice.clone())?;

        let summary = summarize(&tx, invoice)?;
        tx.commit()?;

        info!(
            invoice_id = %summary.invoice.id,
            invoice_no = %summary.invoice.invoice_no,
            invoice_type = %summary.invoice.invoice_type,
            company_id = %summary.invoice.company_id,
            line_count = summary.lines.len(),
            total = %summary.totals.total,
            "invoice approved"
        );

        Ok(ApprovalReceipt { summary, matches })
    }

    /// Consumes cost layers for one sales line and stages the touched layers.
    fn match_sale_line<T: StoreTx>(
        &self,
        tx: &mut T,
        company_id: CompanyId,
        mut sale: InvoiceLine,
        matches: &mut Vec<SaleMatch>,
    ) -> Result<InvoiceLine, InvoiceError> {
        let mut layers = tx.list_unconsumed_purchase_lines(company_id, sale.product_id)?;
        let outcome = FifoMatcher::match_sale(&sale, &mut layers, self.config.profit_loss_mode)?;

        // Every listed layer has stock left, so the consumed ones are a prefix.
        for (layer, consumption) in layers.into_iter().zip(&outcome.consumptions) {
            debug!(
                sale_line_id = %sale.id,
                layer_id = %consumption.layer_id,
                consumed = consumption.consumed,
                remaining = consumption.remaining,
                margin = %consumption.margin(),
                "cost layer consumed"
            );
            tx.save_line(layer)?;
        }

        if outcome.unmatched > 0 {
            warn!(
                sale_line_id = %sale.id,
                product_id = %sale.product_id,
                unmatched = outcome.unmatched,
                "sale exceeds purchase history"
            );
        }

        FifoMatcher::close_sale(&mut sale, &outcome);
        matches.push(SaleMatch {
            line_id: sale.id,
            outcome,
        });

        Ok(sale)
    }
}

fn validate_new_line(input: &NewInvoiceLine) -> Result<(), InvoiceError> {
    if input.quantity == 0 {
        return Err(InvoiceError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    if input.price < Decimal::ZERO {
        return Err(InvoiceError::Validation(format!(
            "price cannot be negative: {}",
            input.price
        )));
    }
    if input.price > Decimal::from(MAX_UNIT_PRICE) {
        return Err(InvoiceError::Validation(format!(
            "price cannot exceed {MAX_UNIT_PRICE}: {}",
            input.price
        )));
    }
    if input.tax > MAX_TAX_RATE {
        return Err(InvoiceError::Validation(format!(
            "tax must be between 0 and {MAX_TAX_RATE}: {}",
            input.tax
        )));
    }
    Ok(())
}

/// Loads an invoice visible to `company_id`.
fn owned_invoice<T: StoreTx>(
    tx: &T,
    company_id: CompanyId,
    invoice_id: InvoiceId,
) -> Result<Invoice, InvoiceError> {
    tx.invoice(invoice_id)?
        .filter(|invoice| invoice.is_owned_by(company_id))
        .ok_or(InvoiceError::InvoiceNotFound(invoice_id))
}

/// First sales line asking for more than its product's stock.
fn find_shortage<T: StoreTx>(
    tx: &T,
    company_id: CompanyId,
    lines: &[InvoiceLine],
) -> Result<Option<(InvoiceLine, InvoiceError)>, InvoiceError> {
    for line in lines {
        let product = tx
            .product(company_id, line.product_id)?
            .ok_or(InvoiceError::ProductNotFound(line.product_id))?;

        if line.quantity > product.quantity_in_stock {
            let err = InvoiceError::InsufficientStock {
                product_id: product.id,
                product_name: product.name,
                requested: line.quantity,
                available: product.quantity_in_stock,
            };
            return Ok(Some((line.clone(), err)));
        }
    }
    Ok(None)
}

fn summarize<T: StoreTx>(tx: &T, invoice: Invoice) -> Result<InvoiceSummary, InvoiceError> {
    let lines = tx.lines(invoice.id)?;
    let totals = InvoiceCalculator::summarize(&lines)?;
    Ok(InvoiceSummary {
        invoice,
        lines,
        totals,
    })
}
