//! Persistence contracts consumed by the invoice service.
//!
//! A store hands out units of work ([`StoreTx`]) that hold a set of keyed
//! locks for their whole lifetime. Writes are staged on the unit of work
//! and published together by [`StoreTx::commit`]; dropping a unit of work
//! without committing discards them.

use std::fmt;

use stockbook_shared::types::{ClientVendorId, CompanyId, InvoiceId, InvoiceLineId, ProductId};

use crate::inventory::stock::StockAccessor;
use crate::invoice::error::InvoiceError;
use crate::invoice::types::{Invoice, InvoiceLine, InvoiceType, Product};

/// A lock held by a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKey {
    /// Serializes edits and approval of one invoice.
    Invoice(InvoiceId),
    /// Serializes stock and cost layers of one product.
    Product(CompanyId, ProductId),
    /// Serializes number assignment per company and type.
    Numbering(CompanyId, InvoiceType),
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invoice(id) => write!(f, "invoice:{id}"),
            Self::Product(company_id, product_id) => write!(f, "product:{company_id}:{product_id}"),
            Self::Numbering(company_id, invoice_type) => {
                write!(f, "numbering:{company_id}:{invoice_type}")
            }
        }
    }
}

/// Source of units of work.
pub trait InvoiceStore {
    /// Unit of work type.
    type Tx<'a>: StoreTx
    where
        Self: 'a;

    /// Opens a unit of work holding every key in `keys`.
    ///
    /// Blocks until all keys are free, then takes them together.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Store` if the store is unusable.
    fn begin(&self, keys: &[LockKey]) -> Result<Self::Tx<'_>, InvoiceError>;
}

/// A locked unit of work over invoices, lines and products.
///
/// Reads see committed data plus this unit's own staged writes.
pub trait StoreTx: StockAccessor {
    /// Invoice by id, including soft-deleted ones.
    fn invoice(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>, InvoiceError>;

    /// Invoices of a company, including soft-deleted ones, in insertion order.
    ///
    /// `invoice_type` narrows the result when given.
    fn invoices(
        &self,
        company_id: CompanyId,
        invoice_type: Option<InvoiceType>,
    ) -> Result<Vec<Invoice>, InvoiceError>;

    /// Non-deleted lines of an invoice in insertion order.
    fn lines(&self, invoice_id: InvoiceId) -> Result<Vec<InvoiceLine>, InvoiceError>;

    /// Line by id, including soft-deleted ones.
    fn line(&self, line_id: InvoiceLineId) -> Result<Option<InvoiceLine>, InvoiceError>;

    /// Product by id within a company.
    fn product(
        &self,
        company_id: CompanyId,
        product_id: ProductId,
    ) -> Result<Option<Product>, InvoiceError>;

    /// Cost layers of a product: non-deleted lines with remaining quantity
    /// on approved, non-deleted purchase invoices of the company.
    ///
    /// Ordered oldest first by invoice date, then invoice insertion order,
    /// then line insertion order.
    fn list_unconsumed_purchase_lines(
        &self,
        company_id: CompanyId,
        product_id: ProductId,
    ) -> Result<Vec<InvoiceLine>, InvoiceError>;

    /// Highest invoice number for the company and type, soft-deleted
    /// invoices included.
    fn latest_invoice_number(
        &self,
        company_id: CompanyId,
        invoice_type: InvoiceType,
    ) -> Result<Option<String>, InvoiceError>;

    /// Returns true if any non-deleted invoice references the client/vendor.
    fn client_vendor_in_use(&self, client_vendor_id: ClientVendorId)
    -> Result<bool, InvoiceError>;

    /// Stages an insert or update of an invoice.
    fn save_invoice(&mut self, invoice: Invoice) -> Result<(), InvoiceError>;

    /// Stages an insert or update of a line.
    fn save_line(&mut self, line: InvoiceLine) -> Result<(), InvoiceError>;

    /// Publishes every staged write at once and releases the locks.
    fn commit(self) -> Result<(), InvoiceError>;
}
