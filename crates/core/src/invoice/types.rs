//! Invoice domain types.
//!
//! An [`Invoice`] owns its [`InvoiceLine`]s; lines only carry the invoice id
//! back. Monetary totals are never stored on the invoice, they are derived
//! from the lines on every read (see [`InvoiceTotals`]).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use stockbook_shared::types::{ClientVendorId, CompanyId, InvoiceId, InvoiceLineId, ProductId};

/// Invoice status in the approval workflow.
///
/// The only transition is AwaitingApproval → Approved, and it is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Invoice is open for edits and waiting for approval.
    AwaitingApproval,
    /// Invoice has been approved; stock and cost layers were updated.
    Approved,
}

impl InvoiceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingApproval => "AWAITING_APPROVAL",
            Self::Approved => "APPROVED",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invoice direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceType {
    /// Goods sold to a client; consumes stock.
    Sales,
    /// Goods bought from a vendor; adds stock and a cost layer.
    Purchase,
}

impl InvoiceType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sales => "SALES",
            Self::Purchase => "PURCHASE",
        }
    }

    /// Letter used as the invoice number prefix.
    #[must_use]
    pub fn prefix(&self) -> char {
        match self {
            Self::Sales => 'S',
            Self::Purchase => 'P',
        }
    }
}

impl fmt::Display for InvoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sales or purchase invoice header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice ID.
    pub id: InvoiceId,
    /// Human-readable number, unique per company and type (e.g. `S-001`).
    pub invoice_no: String,
    /// Workflow status.
    pub status: InvoiceStatus,
    /// Sales or purchase.
    pub invoice_type: InvoiceType,
    /// Issue date.
    pub date: NaiveDate,
    /// Owning company.
    pub company_id: CompanyId,
    /// Client (sales) or vendor (purchase), if assigned.
    pub client_vendor_id: Option<ClientVendorId>,
    /// Soft-delete tombstone.
    pub is_deleted: bool,
}

impl Invoice {
    /// Returns true if the invoice is visible to the given company.
    #[must_use]
    pub fn is_owned_by(&self, company_id: CompanyId) -> bool {
        self.company_id == company_id && !self.is_deleted
    }
}

/// A line item on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Line ID.
    pub id: InvoiceLineId,
    /// Owning invoice.
    pub invoice_id: InvoiceId,
    /// Product sold or bought.
    pub product_id: ProductId,
    /// Quantity, always positive.
    pub quantity: u32,
    /// Unit price excluding tax.
    pub price: Decimal,
    /// Tax rate in whole percent (0-100).
    pub tax: u8,
    /// Profit/loss of a sales line, set on approval.
    pub profit_loss: Decimal,
    /// Unconsumed quantity of a purchase line (its cost layer).
    pub remaining_quantity: u32,
    /// Soft-delete tombstone.
    pub is_deleted: bool,
}

impl InvoiceLine {
    /// Creates a fresh line with no profit/loss and no remaining quantity.
    #[must_use]
    pub fn new(
        invoice_id: InvoiceId,
        product_id: ProductId,
        quantity: u32,
        price: Decimal,
        tax: u8,
    ) -> Self {
        Self {
            id: InvoiceLineId::new(),
            invoice_id,
            product_id,
            quantity,
            price,
            tax,
            profit_loss: Decimal::ZERO,
            remaining_quantity: 0,
            is_deleted: false,
        }
    }
}

/// A stock-keeping product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Owning company.
    pub company_id: CompanyId,
    /// Units currently in stock.
    pub quantity_in_stock: u32,
}

/// Derived monetary totals of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Sum of unit price × quantity.
    pub price: Decimal,
    /// Sum of line tax amounts.
    pub tax: Decimal,
    /// Price plus tax.
    pub total: Decimal,
}

/// An invoice together with its live lines and derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    /// The invoice header.
    pub invoice: Invoice,
    /// Non-deleted lines.
    pub lines: Vec<InvoiceLine>,
    /// Totals computed from `lines`.
    pub totals: InvoiceTotals,
}

/// Unsaved invoice header produced by the number generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    /// Next invoice number for the company and type.
    pub invoice_no: String,
    /// Proposed issue date.
    pub date: NaiveDate,
    /// Sales or purchase.
    pub invoice_type: InvoiceType,
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    /// Issue date.
    pub date: NaiveDate,
    /// Client or vendor.
    pub client_vendor_id: Option<ClientVendorId>,
}

/// Input for adding a line to an invoice.
#[derive(Debug, Clone)]
pub struct NewInvoiceLine {
    /// Product.
    pub product_id: ProductId,
    /// Quantity, must be positive.
    pub quantity: u32,
    /// Unit price, must not be negative.
    pub price: Decimal,
    /// Tax rate in whole percent.
    pub tax: u8,
}

/// Editable invoice fields. Number, status, type, date and company are fixed.
#[derive(Debug, Clone, Default)]
pub struct InvoiceUpdate {
    /// New client or vendor.
    pub client_vendor_id: Option<ClientVendorId>,
}
