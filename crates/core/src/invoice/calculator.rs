//! Monetary calculations for invoices.
//!
//! CRITICAL: two different rounding rules are in play and both affect
//! reported figures:
//! - Invoice tax rounds the per-unit tax amount UP (ceiling) to the
//!   currency's smallest unit, then multiplies by quantity.
//! - Cost matching rounds the tax *rate* half-up to 2 decimal places
//!   and never rounds the amount.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::invoice::error::InvoiceError;
use crate::invoice::types::{InvoiceLine, InvoiceTotals};

/// Divisor turning a whole-percent tax rate into a fraction.
pub const PERCENT_DIVISOR: Decimal = Decimal::ONE_HUNDRED;

/// Decimal places of the currency's smallest unit.
pub const CURRENCY_SCALE: u32 = 2;

/// Decimal places kept on a tax rate used for cost matching.
pub const RATE_SCALE: u32 = 2;

/// Stateless calculator for invoice amounts.
pub struct InvoiceCalculator;

impl InvoiceCalculator {
    /// Tax amount of a single line.
    ///
    /// `ceil(unit_price * tax / 100)` at [`CURRENCY_SCALE`], times quantity.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvalidAmount` if the result is negative and
    /// `InvoiceError::AmountOverflow` if it does not fit a decimal.
    pub fn line_tax_amount(
        unit_price: Decimal,
        tax: u8,
        quantity: u32,
    ) -> Result<Decimal, InvoiceError> {
        let unit_tax = (mul(unit_price, Decimal::from(tax))? / PERCENT_DIVISOR)
            .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::ToPositiveInfinity);
        let amount = mul(unit_tax, Decimal::from(quantity))?;

        if amount < Decimal::ZERO {
            return Err(InvoiceError::InvalidAmount(amount));
        }

        Ok(amount)
    }

    /// Total tax over all lines.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvalidAmount` if any line or the sum is
    /// negative, `InvoiceError::AmountOverflow` if the sum overflows.
    pub fn invoice_tax(lines: &[InvoiceLine]) -> Result<Decimal, InvoiceError> {
        let mut sum = Decimal::ZERO;
        for line in lines {
            sum = add(sum, Self::line_tax_amount(line.price, line.tax, line.quantity)?)?;
        }

        if sum < Decimal::ZERO {
            return Err(InvoiceError::InvalidAmount(sum));
        }

        Ok(sum)
    }

    /// Sum of unit price × quantity.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::AmountOverflow` if the sum does not fit a decimal.
    pub fn invoice_price_excluding_tax(lines: &[InvoiceLine]) -> Result<Decimal, InvoiceError> {
        lines.iter().try_fold(Decimal::ZERO, |sum, line| {
            add(sum, mul(line.price, Decimal::from(line.quantity))?)
        })
    }

    /// Price excluding tax plus tax.
    ///
    /// # Errors
    ///
    /// Propagates `InvoiceError::InvalidAmount` and `InvoiceError::AmountOverflow`.
    pub fn invoice_total(lines: &[InvoiceLine]) -> Result<Decimal, InvoiceError> {
        add(
            Self::invoice_price_excluding_tax(lines)?,
            Self::invoice_tax(lines)?,
        )
    }

    /// Price, tax and total in one pass over the lines.
    ///
    /// # Errors
    ///
    /// Propagates `InvoiceError::InvalidAmount` and `InvoiceError::AmountOverflow`.
    pub fn summarize(lines: &[InvoiceLine]) -> Result<InvoiceTotals, InvoiceError> {
        let price = Self::invoice_price_excluding_tax(lines)?;
        let tax = Self::invoice_tax(lines)?;

        Ok(InvoiceTotals {
            price,
            tax,
            total: add(price, tax)?,
        })
    }

    /// Tax-inclusive value of `quantity` units, used by cost matching.
    ///
    /// `unit_price × quantity × (1 + round_half_up(tax / 100, 2))`
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::AmountOverflow` if the value does not fit a decimal.
    pub fn line_gross_value(
        unit_price: Decimal,
        quantity: u32,
        tax: u8,
    ) -> Result<Decimal, InvoiceError> {
        let net = mul(unit_price, Decimal::from(quantity))?;
        let rate = (Decimal::from(tax) / PERCENT_DIVISOR)
            .round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero);
        add(net, mul(net, rate)?)
    }
}

pub(crate) fn add(a: Decimal, b: Decimal) -> Result<Decimal, InvoiceError> {
    a.checked_add(b).ok_or(InvoiceError::AmountOverflow)
}

fn mul(a: Decimal, b: Decimal) -> Result<Decimal, InvoiceError> {
    a.checked_mul(b).ok_or(InvoiceError::AmountOverflow)
}
