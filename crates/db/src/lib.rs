//! Storage layer for Stockbook.
//!
//! This crate provides:
//! - [`MemoryStore`], an in-memory implementation of the invoice store contracts
//! - [`KeyedLocks`], the lock table its units of work are serialized by

pub mod locks;
pub mod memory;

pub use locks::{KeyedLocks, LockGuard};
pub use memory::{MemoryStore, MemoryTx};

use stockbook_core::invoice::InvoiceService;
use stockbook_shared::LedgerConfig;

/// Builds an invoice service over a fresh in-memory store.
#[must_use]
pub fn memory_service(config: LedgerConfig) -> InvoiceService<MemoryStore> {
    InvoiceService::new(MemoryStore::new(), config)
}
