//! Invoice lifecycle for Stockbook.
//!
//! # Modules
//!
//! - `types` - Invoice domain types (Invoice, InvoiceLine, Product)
//! - `error` - Invoice-specific error types
//! - `calculator` - Tax and total computation
//! - `numbering` - Sequential invoice numbers
//! - `workflow` - Approval state machine rules
//! - `store` - Persistence contracts
//! - `service` - Create, edit, query and approve invoices

pub mod calculator;
pub mod error;
pub mod numbering;
pub mod service;
pub mod store;
pub mod types;
pub mod workflow;

#[cfg(test)]
mod calculator_props;

pub use calculator::InvoiceCalculator;
pub use error::InvoiceError;
pub use numbering::InvoiceNumbering;
pub use service::{ApprovalReceipt, InvoiceService, SaleMatch};
pub use store::{InvoiceStore, LockKey, StoreTx};
pub use types::{
    Invoice, InvoiceDraft, InvoiceLine, InvoiceStatus, InvoiceSummary, InvoiceTotals, InvoiceType,
    InvoiceUpdate, NewInvoice, NewInvoiceLine, Product,
};
pub use workflow::InvoiceWorkflow;
