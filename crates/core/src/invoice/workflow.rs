//! Invoice status transitions.
//!
//! The state machine is tiny: AwaitingApproval → Approved, once, with no
//! way back. Soft deletion is a separate tombstone flag and blocks every
//! transition.

use crate::invoice::error::InvoiceError;
use crate::invoice::types::{Invoice, InvoiceStatus};

/// Stateless validator for invoice state transitions.
pub struct InvoiceWorkflow;

impl InvoiceWorkflow {
    /// Validate that an invoice can be approved.
    ///
    /// # Returns
    /// * `Ok(InvoiceStatus::Approved)` if the transition is valid
    /// * `Err(InvoiceError::InvoiceNotFound)` if the invoice is soft-deleted
    /// * `Err(InvoiceError::InvalidTransition)` if it is already approved
    pub fn approve(invoice: &Invoice) -> Result<InvoiceStatus, InvoiceError> {
        if invoice.is_deleted {
            return Err(InvoiceError::InvoiceNotFound(invoice.id));
        }

        match invoice.status {
            InvoiceStatus::AwaitingApproval => Ok(InvoiceStatus::Approved),
            InvoiceStatus::Approved => Err(InvoiceError::InvalidTransition {
                from: invoice.status,
                to: InvoiceStatus::Approved,
            }),
        }
    }

    /// Validate that the invoice's lines can still be edited.
    ///
    /// # Errors
    ///
    /// Returns error if the invoice is deleted or approved.
    pub fn validate_can_modify(invoice: &Invoice) -> Result<(), InvoiceError> {
        if invoice.is_deleted {
            return Err(InvoiceError::InvoiceNotFound(invoice.id));
        }

        match invoice.status {
            InvoiceStatus::AwaitingApproval => Ok(()),
            InvoiceStatus::Approved => Err(InvoiceError::CannotModifyApproved),
        }
    }
}
