//! Sequential invoice numbering.
//!
//! Numbers look like `S-001` / `P-042`: the type's first letter, a dash,
//! and a zero-padded sequence. The sequence is per company and type and
//! counts soft-deleted invoices, so a number is never handed out twice.

use std::cmp::Ordering;

use crate::invoice::error::InvoiceError;
use crate::invoice::types::InvoiceType;

/// Minimum number of digits in the sequence part.
pub const SEQUENCE_WIDTH: usize = 3;

/// Stateless invoice number generator.
pub struct InvoiceNumbering;

impl InvoiceNumbering {
    /// Derives the number following `latest`.
    ///
    /// # Arguments
    /// * `latest` - Highest existing number for the company and type, if any
    /// * `invoice_type` - Type of the invoice being numbered
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvalidState` if `latest` is not `<letter>-<digits>`
    /// or the sequence would overflow.
    pub fn next(latest: Option<&str>, invoice_type: InvoiceType) -> Result<String, InvoiceError> {
        let next = match latest {
            None => 1,
            Some(number) => Self::parse(number)?
                .checked_add(1)
                .ok_or_else(|| InvoiceError::InvalidState(format!("invoice number {number} overflows")))?,
        };

        Ok(Self::format(invoice_type, next))
    }

    /// Formats a sequence value for the given type.
    #[must_use]
    pub fn format(invoice_type: InvoiceType, sequence: u32) -> String {
        format!(
            "{}-{sequence:0width$}",
            invoice_type.prefix(),
            width = SEQUENCE_WIDTH
        )
    }

    /// Extracts the numeric sequence from `<letter>-<digits>`.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvalidState` if the number is malformed.
    pub fn parse(number: &str) -> Result<u32, InvoiceError> {
        let malformed = || InvoiceError::InvalidState(format!("malformed invoice number: {number:?}"));

        let mut chars = number.chars();
        let letter = chars.next().ok_or_else(malformed)?;
        if !letter.is_ascii_alphabetic() || chars.next() != Some('-') {
            return Err(malformed());
        }

        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        digits.parse::<u32>().map_err(|_| malformed())
    }

    /// Orders numbers by their sequence, so `S-1000` follows `S-999`.
    ///
    /// Malformed numbers sort after every well-formed one.
    #[must_use]
    pub fn compare(a: &str, b: &str) -> Ordering {
        match (Self::parse(a), Self::parse(b)) {
            (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        }
    }

    /// Picks the highest number out of `numbers`.
    pub fn latest<'a, I>(numbers: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        numbers.into_iter().max_by(|a, b| Self::compare(a, b))
    }
}
