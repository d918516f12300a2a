//! In-memory invoice store.
//!
//! Committed data lives behind one `RwLock`. A [`MemoryTx`] holds its keyed
//! locks, stages writes in private maps, reads through them onto the
//! committed data, and publishes everything under a single write lock on
//! commit. Dropping a `MemoryTx` discards its staged writes.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::trace;

use stockbook_core::inventory::StockAccessor;
use stockbook_core::invoice::{
    Invoice, InvoiceError, InvoiceLine, InvoiceNumbering, InvoiceStatus, InvoiceStore,
    InvoiceType, LockKey, Product, StoreTx,
};
use stockbook_shared::types::{ClientVendorId, CompanyId, InvoiceId, InvoiceLineId, ProductId};

use crate::locks::{KeyedLocks, LockGuard};

/// A record with its insertion sequence.
#[derive(Debug, Clone)]
struct Stored<T> {
    seq: u64,
    value: T,
}

#[derive(Debug, Default)]
struct State {
    invoices: HashMap<InvoiceId, Stored<Invoice>>,
    lines: HashMap<InvoiceLineId, Stored<InvoiceLine>>,
    products: HashMap<ProductId, Product>,
}

/// Thread-safe in-memory implementation of [`InvoiceStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    locks: KeyedLocks,
    next_seq: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a product with an initial stock level.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Store` if the store is poisoned.
    pub fn insert_product(
        &self,
        company_id: CompanyId,
        name: impl Into<String>,
        quantity_in_stock: u32,
    ) -> Result<Product, InvoiceError> {
        let product = Product {
            id: ProductId::new(),
            name: name.into(),
            company_id,
            quantity_in_stock,
        };

        self.write()?.products.insert(product.id, product.clone());
        Ok(product)
    }

    /// Committed state of a product.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Store` if the store is poisoned.
    pub fn product(&self, product_id: ProductId) -> Result<Option<Product>, InvoiceError> {
        Ok(self.read()?.products.get(&product_id).cloned())
    }

    /// Committed state of a line, including soft-deleted lines.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Store` if the store is poisoned.
    pub fn line(&self, line_id: InvoiceLineId) -> Result<Option<InvoiceLine>, InvoiceError> {
        Ok(self
            .read()?
            .lines
            .get(&line_id)
            .map(|stored| stored.value.clone()))
    }

    /// Committed lines of an invoice, including soft-deleted lines.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Store` if the store is poisoned.
    pub fn all_lines(&self, invoice_id: InvoiceId) -> Result<Vec<InvoiceLine>, InvoiceError> {
        let state = self.read()?;
        let mut lines: Vec<&Stored<InvoiceLine>> = state
            .lines
            .values()
            .filter(|stored| stored.value.invoice_id == invoice_id)
            .collect();
        lines.sort_by_key(|stored| stored.seq);
        Ok(lines.into_iter().map(|stored| stored.value.clone()).collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, InvoiceError> {
        self.state.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, InvoiceError> {
        self.state.write().map_err(poisoned)
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}

impl InvoiceStore for MemoryStore {
    type Tx<'a> = MemoryTx<'a>;

    fn begin(&self, keys: &[LockKey]) -> Result<MemoryTx<'_>, InvoiceError> {
        let guard = self.locks.acquire(keys)?;
        Ok(MemoryTx {
            store: self,
            guard,
            invoices: HashMap::new(),
            lines: HashMap::new(),
            stock: HashMap::new(),
        })
    }
}

/// A unit of work over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx<'a> {
    store: &'a MemoryStore,
    guard: LockGuard<'a>,
    invoices: HashMap<InvoiceId, Stored<Invoice>>,
    lines: HashMap<InvoiceLineId, Stored<InvoiceLine>>,
    stock: HashMap<ProductId, u32>,
}

impl MemoryTx<'_> {
    /// Returns true if nothing has been staged yet.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.invoices.is_empty() && self.lines.is_empty() && self.stock.is_empty()
    }

    /// Keys held by this unit of work.
    #[must_use]
    pub fn holds(&self, key: &LockKey) -> bool {
        self.guard.keys().contains(key)
    }

    fn staged_invoices(&self) -> Result<Vec<Stored<Invoice>>, InvoiceError> {
        let state = self.store.read()?;
        Ok(overlay(&state.invoices, &self.invoices))
    }

    fn staged_lines(&self) -> Result<Vec<Stored<InvoiceLine>>, InvoiceError> {
        let state = self.store.read()?;
        Ok(overlay(&state.lines, &self.lines))
    }

    /// Sequence of an existing record, or a fresh one for a new record.
    fn seq_for<K, T>(
        &self,
        staged: &HashMap<K, Stored<T>>,
        committed: impl FnOnce(&State) -> Option<u64>,
        key: &K,
    ) -> Result<u64, InvoiceError>
    where
        K: Eq + Hash,
    {
        if let Some(stored) = staged.get(key) {
            return Ok(stored.seq);
        }
        let existing = committed(&*self.store.read()?);
        Ok(existing.unwrap_or_else(|| self.store.next_seq()))
    }
}

impl StockAccessor for MemoryTx<'_> {
    fn get_stock(&self, product_id: ProductId) -> Result<u32, InvoiceError> {
        if let Some(&quantity) = self.stock.get(&product_id) {
            return Ok(quantity);
        }
        self.store
            .read()?
            .products
            .get(&product_id)
            .map(|product| product.quantity_in_stock)
            .ok_or(InvoiceError::ProductNotFound(product_id))
    }

    fn set_stock(&mut self, product_id: ProductId, quantity: u32) -> Result<(), InvoiceError> {
        if !self.store.read()?.products.contains_key(&product_id) {
            return Err(InvoiceError::ProductNotFound(product_id));
        }
        self.stock.insert(product_id, quantity);
        Ok(())
    }

    fn product_name(&self, product_id: ProductId) -> Result<String, InvoiceError> {
        self.store
            .read()?
            .products
            .get(&product_id)
            .map(|product| product.name.clone())
            .ok_or(InvoiceError::ProductNotFound(product_id))
    }
}

impl StoreTx for MemoryTx<'_> {
    fn invoice(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>, InvoiceError> {
        if let Some(stored) = self.invoices.get(&invoice_id) {
            return Ok(Some(stored.value.clone()));
        }
        Ok(self
            .store
            .read()?
            .invoices
            .get(&invoice_id)
            .map(|stored| stored.value.clone()))
    }

    fn invoices(
        &self,
        company_id: CompanyId,
        invoice_type: Option<InvoiceType>,
    ) -> Result<Vec<Invoice>, InvoiceError> {
        Ok(self
            .staged_invoices()?
            .into_iter()
            .map(|stored| stored.value)
            .filter(|invoice| {
                invoice.company_id == company_id
                    && invoice_type.is_none_or(|wanted| invoice.invoice_type == wanted)
            })
            .collect())
    }

    fn lines(&self, invoice_id: InvoiceId) -> Result<Vec<InvoiceLine>, InvoiceError> {
        Ok(self
            .staged_lines()?
            .into_iter()
            .map(|stored| stored.value)
            .filter(|line| line.invoice_id == invoice_id && !line.is_deleted)
            .collect())
    }

    fn line(&self, line_id: InvoiceLineId) -> Result<Option<InvoiceLine>, InvoiceError> {
        if let Some(stored) = self.lines.get(&line_id) {
            return Ok(Some(stored.value.clone()));
        }
        Ok(self
            .store
            .read()?
            .lines
            .get(&line_id)
            .map(|stored| stored.value.clone()))
    }

    fn product(
        &self,
        company_id: CompanyId,
        product_id: ProductId,
    ) -> Result<Option<Product>, InvoiceError> {
        let product = self
            .store
            .read()?
            .products
            .get(&product_id)
            .filter(|product| product.company_id == company_id)
            .cloned();

        Ok(product.map(|mut product| {
            if let Some(&quantity) = self.stock.get(&product_id) {
                product.quantity_in_stock = quantity;
            }
            product
        }))
    }

    fn list_unconsumed_purchase_lines(
        &self,
        company_id: CompanyId,
        product_id: ProductId,
    ) -> Result<Vec<InvoiceLine>, InvoiceError> {
        let invoices: HashMap<InvoiceId, Stored<Invoice>> = self
            .staged_invoices()?
            .into_iter()
            .filter(|stored| {
                let invoice = &stored.value;
                invoice.company_id == company_id
                    && invoice.invoice_type == InvoiceType::Purchase
                    && invoice.status == InvoiceStatus::Approved
                    && !invoice.is_deleted
            })
            .map(|stored| (stored.value.id, stored))
            .collect();

        let mut layers: Vec<(&Stored<Invoice>, Stored<InvoiceLine>)> = self
            .staged_lines()?
            .into_iter()
            .filter(|stored| {
                let line = &stored.value;
                line.product_id == product_id && line.remaining_quantity > 0 && !line.is_deleted
            })
            .filter_map(|stored| {
                invoices
                    .get(&stored.value.invoice_id)
                    .map(|invoice| (invoice, stored))
            })
            .collect();

        layers.sort_by_key(|(invoice, line)| (invoice.value.date, invoice.seq, line.seq));

        Ok(layers.into_iter().map(|(_, line)| line.value).collect())
    }

    fn latest_invoice_number(
        &self,
        company_id: CompanyId,
        invoice_type: InvoiceType,
    ) -> Result<Option<String>, InvoiceError> {
        let invoices = self.invoices(company_id, Some(invoice_type))?;
        Ok(
            InvoiceNumbering::latest(invoices.iter().map(|invoice| invoice.invoice_no.as_str()))
                .map(str::to_string),
        )
    }

    fn client_vendor_in_use(&self, client_vendor_id: ClientVendorId) -> Result<bool, InvoiceError> {
        Ok(self.staged_invoices()?.iter().any(|stored| {
            !stored.value.is_deleted && stored.value.client_vendor_id == Some(client_vendor_id)
        }))
    }

    fn save_invoice(&mut self, invoice: Invoice) -> Result<(), InvoiceError> {
        let id = invoice.id;
        let seq = self.seq_for(
            &self.invoices,
            |state| state.invoices.get(&id).map(|stored| stored.seq),
            &id,
        )?;
        self.invoices.insert(id, Stored { seq, value: invoice });
        Ok(())
    }

    fn save_line(&mut self, line: InvoiceLine) -> Result<(), InvoiceError> {
        let id = line.id;
        let seq = self.seq_for(
            &self.lines,
            |state| state.lines.get(&id).map(|stored| stored.seq),
            &id,
        )?;
        self.lines.insert(id, Stored { seq, value: line });
        Ok(())
    }

    fn commit(self) -> Result<(), InvoiceError> {
        let (invoice_count, line_count, stock_count) =
            (self.invoices.len(), self.lines.len(), self.stock.len());

        let mut state = self.store.write()?;
        for (id, product) in &mut state.products {
            if let Some(&quantity) = self.stock.get(id) {
                product.quantity_in_stock = quantity;
            }
        }
        state.invoices.extend(self.invoices);
        state.lines.extend(self.lines);
        drop(state);

        trace!(
            invoices = invoice_count,
            lines = line_count,
            stock = stock_count,
            "unit of work committed"
        );

        Ok(())
    }
}

/// Committed records with staged ones laid over them, in insertion order.
fn overlay<K, T>(committed: &HashMap<K, Stored<T>>, staged: &HashMap<K, Stored<T>>) -> Vec<Stored<T>>
where
    K: Eq + Hash,
    T: Clone,
{
    let mut merged: Vec<Stored<T>> = committed
        .iter()
        .filter(|(key, _)| !staged.contains_key(key))
        .map(|(_, stored)| stored.clone())
        .chain(staged.values().cloned())
        .collect();
    merged.sort_by_key(|stored| stored.seq);
    merged
}

fn poisoned<T>(_: PoisonError<T>) -> InvoiceError {
    InvoiceError::Store("invoice store poisoned".to_string())
}
