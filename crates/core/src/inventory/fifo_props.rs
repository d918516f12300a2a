//! Property-based tests for FifoMatcher.
//!
//! Random purchase histories are matched against random sales to check
//! quantity conservation, FIFO ordering and both profit/loss modes.

use proptest::prelude::*;
use rust_decimal::Decimal;

use stockbook_shared::types::{InvoiceId, ProductId, ProfitLossMode};

use crate::inventory::fifo::FifoMatcher;
use crate::invoice::types::InvoiceLine;

/// Strategy for a price between 0.00 and 999.99.
fn arb_price() -> impl Strategy<Value = Decimal> {
    (0i64..100_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a purchase history of up to 8 layers.
fn arb_layers() -> impl Strategy<Value = Vec<(u32, Decimal, u8)>> {
    prop::collection::vec((0u32..50, arb_price(), 0u8..=100), 0..8)
}

fn build_layers(product_id: ProductId, specs: &[(u32, Decimal, u8)]) -> Vec<InvoiceLine> {
    specs
        .iter()
        .map(|&(remaining, price, tax)| {
            let mut line =
                InvoiceLine::new(InvoiceId::new(), product_id, remaining.max(1), price, tax);
            FifoMatcher::open_layer(&mut line);
            line.remaining_quantity = remaining;
            line
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Matched plus unmatched units always equal the sale quantity, and
    /// matching covers the sale whenever history is large enough.
    #[test]
    fn prop_quantity_is_conserved(
        specs in arb_layers(),
        quantity in 1u32..200,
        price in arb_price(),
        tax in 0u8..=100,
    ) {
        let product_id = ProductId::new();
        let mut layers = build_layers(product_id, &specs);
        let available: u32 = layers.iter().map(|l| l.remaining_quantity).sum();
        let sale = InvoiceLine::new(InvoiceId::new(), product_id, quantity, price, tax);

        let outcome =
            FifoMatcher::match_sale(&sale, &mut layers, ProfitLossMode::LastLayer).unwrap();

        prop_assert_eq!(outcome.matched() + outcome.unmatched, quantity);
        prop_assert_eq!(outcome.matched(), quantity.min(available));

        let left: u32 = layers.iter().map(|l| l.remaining_quantity).sum();
        prop_assert_eq!(available - left, outcome.matched());
    }

    /// Layers only shrink, stay within their quantity, and every layer
    /// before the last one touched is fully drained.
    #[test]
    fn prop_layers_drain_in_order(
        specs in arb_layers(),
        quantity in 1u32..200,
    ) {
        let product_id = ProductId::new();
        let mut layers = build_layers(product_id, &specs);
        let before: Vec<u32> = layers.iter().map(|l| l.remaining_quantity).collect();
        let sale = InvoiceLine::new(InvoiceId::new(), product_id, quantity, Decimal::ONE, 0);

        let outcome =
            FifoMatcher::match_sale(&sale, &mut layers, ProfitLossMode::LastLayer).unwrap();

        for (layer, was) in layers.iter().zip(&before) {
            prop_assert!(layer.remaining_quantity <= *was);
            prop_assert!(layer.remaining_quantity <= layer.quantity);
        }

        if let Some(last) = outcome.consumptions.last() {
            let last_index = layers.iter().position(|l| l.id == last.layer_id).unwrap();
            for layer in &layers[..last_index] {
                prop_assert_eq!(layer.remaining_quantity, 0);
            }
            for (layer, was) in layers[last_index + 1..].iter().zip(&before[last_index + 1..]) {
                prop_assert_eq!(layer.remaining_quantity, *was);
            }
        }
    }

    /// Cumulative mode reports the sum of slice margins; last-layer mode
    /// reports only the final slice.
    #[test]
    fn prop_profit_loss_modes(
        specs in arb_layers(),
        quantity in 1u32..200,
        price in arb_price(),
        tax in 0u8..=100,
    ) {
        let product_id = ProductId::new();
        let sale = InvoiceLine::new(InvoiceId::new(), product_id, quantity, price, tax);

        let mut cumulative_layers = build_layers(product_id, &specs);
        let cumulative =
            FifoMatcher::match_sale(&sale, &mut cumulative_layers, ProfitLossMode::Cumulative)
                .unwrap();
        let mut last_layers = build_layers(product_id, &specs);
        let last =
            FifoMatcher::match_sale(&sale, &mut last_layers, ProfitLossMode::LastLayer).unwrap();

        let sum: Decimal = cumulative.consumptions.iter().map(|c| c.margin()).sum();
        prop_assert_eq!(cumulative.profit_loss, sum);

        let expected_last = last
            .consumptions
            .last()
            .map_or(Decimal::ZERO, |c| c.margin());
        prop_assert_eq!(last.profit_loss, expected_last);

        if cumulative.consumptions.len() <= 1 {
            prop_assert_eq!(cumulative.profit_loss, last.profit_loss);
        }
    }
}
