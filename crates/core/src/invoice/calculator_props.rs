//! Property-based tests for InvoiceCalculator.

use proptest::prelude::*;
use rust_decimal::Decimal;

use stockbook_shared::types::{InvoiceId, ProductId};

use super::calculator::{CURRENCY_SCALE, InvoiceCalculator};
use super::types::InvoiceLine;

/// Strategy for a unit price between 0.00 and 99,999.99.
fn unit_price() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_lines() -> impl Strategy<Value = Vec<InvoiceLine>> {
    prop::collection::vec((1u32..1_000, unit_price(), 0u8..=100), 0..10).prop_map(|specs| {
        specs
            .into_iter()
            .map(|(quantity, price, tax)| {
                InvoiceLine::new(InvoiceId::new(), ProductId::new(), quantity, price, tax)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Line tax never lands below the exact tax, and exceeds it by less
    /// than one cent per unit.
    #[test]
    fn prop_line_tax_is_per_unit_ceiling(
        price in unit_price(),
        tax in 0u8..=100,
        quantity in 1u32..1_000,
    ) {
        let amount = InvoiceCalculator::line_tax_amount(price, tax, quantity).unwrap();
        let exact = price * Decimal::from(tax) / Decimal::ONE_HUNDRED * Decimal::from(quantity);
        let cent = Decimal::new(1, CURRENCY_SCALE);

        prop_assert!(amount >= exact);
        prop_assert!(amount - exact < cent * Decimal::from(quantity));
        prop_assert!(amount >= Decimal::ZERO);
    }

    /// Same lines, same totals.
    #[test]
    fn prop_summarize_is_idempotent(lines in arb_lines()) {
        let first = InvoiceCalculator::summarize(&lines).unwrap();
        let second = InvoiceCalculator::summarize(&lines).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Total is price plus tax, and all three are non-negative.
    #[test]
    fn prop_totals_are_consistent(lines in arb_lines()) {
        let totals = InvoiceCalculator::summarize(&lines).unwrap();

        prop_assert_eq!(totals.total, totals.price + totals.tax);
        prop_assert!(totals.price >= Decimal::ZERO);
        prop_assert!(totals.tax >= Decimal::ZERO);
        prop_assert_eq!(totals.total, InvoiceCalculator::invoice_total(&lines).unwrap());
    }

    /// Gross value is at least the net value and at most twice it.
    #[test]
    fn prop_gross_value_bounds(
        price in unit_price(),
        quantity in 0u32..1_000,
        tax in 0u8..=100,
    ) {
        let net = price * Decimal::from(quantity);
        let gross = InvoiceCalculator::line_gross_value(price, quantity, tax).unwrap();

        prop_assert!(gross >= net);
        prop_assert!(gross <= net * Decimal::TWO);
    }
}
