//! Keyed lock table.
//!
//! A unit of work names every key it needs up front and takes them all in
//! one step, waiting while any of them is held. Nobody ever holds some keys
//! while waiting for others, so acquisition cannot deadlock.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

use stockbook_core::invoice::{InvoiceError, LockKey};

/// Table of currently held keys.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    held: Mutex<HashSet<LockKey>>,
    released: Condvar,
}

impl KeyedLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until every key is free, then takes them together.
    ///
    /// Duplicate keys are taken once. An empty key set returns immediately.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Store` if the lock table is poisoned.
    pub fn acquire(&self, keys: &[LockKey]) -> Result<LockGuard<'_>, InvoiceError> {
        let wanted: HashSet<LockKey> = keys.iter().copied().collect();
        if wanted.is_empty() {
            return Ok(LockGuard {
                locks: self,
                keys: wanted,
            });
        }

        let mut held = self.held.lock().map_err(poisoned)?;
        while !held.is_disjoint(&wanted) {
            held = self.released.wait(held).map_err(poisoned)?;
        }
        held.extend(wanted.iter().copied());

        Ok(LockGuard {
            locks: self,
            keys: wanted,
        })
    }
}

/// Keys held by one unit of work; released on drop.
#[derive(Debug)]
pub struct LockGuard<'a> {
    locks: &'a KeyedLocks,
    keys: HashSet<LockKey>,
}

impl LockGuard<'_> {
    /// Keys held by this guard.
    #[must_use]
    pub fn keys(&self) -> &HashSet<LockKey> {
        &self.keys
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.keys.is_empty() {
            return;
        }

        // Release even after a panic elsewhere poisoned the table.
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for key in &self.keys {
            held.remove(key);
        }
        drop(held);

        self.locks.released.notify_all();
    }
}

fn poisoned<T>(_: PoisonError<T>) -> InvoiceError {
    InvoiceError::Store("lock table poisoned".to_string())
}
