//! Invoice error types.
//!
//! This module defines all errors that can occur while creating,
//! editing, numbering and approving invoices.

use rust_decimal::Decimal;
use thiserror::Error;

use stockbook_shared::types::{InvoiceId, InvoiceLineId, ProductId};

use crate::invoice::types::InvoiceStatus;

/// Errors that can occur during invoice operations.
#[derive(Debug, Error)]
pub enum InvoiceError {
    // ========== Lookup Errors ==========
    /// Invoice not found, deleted, or owned by another company.
    #[error("Invoice {0} not found")]
    InvoiceNotFound(InvoiceId),

    /// Product not found in the company.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// Invoice line not found on the invoice.
    #[error("Invoice line {0} not found")]
    LineNotFound(InvoiceLineId),

    // ========== Stock Errors ==========
    /// Requested quantity exceeds the product's stock.
    #[error(
        "Product {product_name} does not have enough stock: requested {requested}, available {available}"
    )]
    InsufficientStock {
        /// The product that is short.
        product_id: ProductId,
        /// Product display name.
        product_name: String,
        /// Quantity the invoice asked for.
        requested: u32,
        /// Quantity in stock.
        available: u32,
    },

    // ========== Invariant Errors ==========
    /// A computed amount was negative.
    #[error("Amount cannot be negative: {0}")]
    InvalidAmount(Decimal),

    /// A computed amount does not fit a decimal.
    #[error("Amount overflowed")]
    AmountOverflow,

    /// Stored data is inconsistent (e.g. malformed invoice number).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ========== Workflow Errors ==========
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: InvoiceStatus,
        /// The attempted target status.
        to: InvoiceStatus,
    },

    /// Attempted to edit an approved invoice.
    #[error("Cannot modify approved invoice")]
    CannotModifyApproved,

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store or lock failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl InvoiceError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. } | Self::CannotModifyApproved | Self::Validation(_) => {
                400
            }

            Self::InvoiceNotFound(_) | Self::ProductNotFound(_) | Self::LineNotFound(_) => 404,

            Self::InsufficientStock { .. } => 422,

            Self::InvalidAmount(_)
            | Self::AmountOverflow
            | Self::InvalidState(_)
            | Self::Store(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::LineNotFound(_) => "INVOICE_LINE_NOT_FOUND",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::CannotModifyApproved => "CANNOT_MODIFY_APPROVED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns true for lookup failures.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }
}
