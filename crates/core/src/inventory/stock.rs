//! Stock counter arithmetic.

use stockbook_shared::types::ProductId;

use crate::invoice::error::InvoiceError;

/// Read/write access to product stock counters.
///
/// Implementations are expected to serialize access per product; the
/// ledger itself only does checked arithmetic.
pub trait StockAccessor {
    /// Current stock of a product.
    fn get_stock(&self, product_id: ProductId) -> Result<u32, InvoiceError>;

    /// Overwrite the stock of a product.
    fn set_stock(&mut self, product_id: ProductId, quantity: u32) -> Result<(), InvoiceError>;

    /// Display name used in stock errors.
    fn product_name(&self, product_id: ProductId) -> Result<String, InvoiceError> {
        Ok(product_id.to_string())
    }
}

/// Stateless stock ledger.
pub struct StockLedger;

impl StockLedger {
    /// Removes `quantity` units from stock and returns the new level.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InsufficientStock` if stock would go negative.
    pub fn decrease<A>(
        accessor: &mut A,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<u32, InvoiceError>
    where
        A: StockAccessor + ?Sized,
    {
        let available = accessor.get_stock(product_id)?;
        let Some(updated) = available.checked_sub(quantity) else {
            return Err(InvoiceError::InsufficientStock {
                product_id,
                product_name: accessor.product_name(product_id)?,
                requested: quantity,
                available,
            });
        };

        accessor.set_stock(product_id, updated)?;
        Ok(updated)
    }

    /// Adds `quantity` units to stock and returns the new level.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvalidState` if the counter would overflow.
    pub fn increase<A>(
        accessor: &mut A,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<u32, InvoiceError>
    where
        A: StockAccessor + ?Sized,
    {
        let current = accessor.get_stock(product_id)?;
        let updated = current.checked_add(quantity).ok_or_else(|| {
            InvoiceError::InvalidState(format!("stock counter of product {product_id} overflows"))
        })?;

        accessor.set_stock(product_id, updated)?;
        Ok(updated)
    }
}
