//! FIFO cost matching.
//!
//! Every approved purchase line is a cost layer: `remaining_quantity`
//! units bought at its price and tax. A sale eats the oldest layers first
//! and its profit/loss is priced from the layers it consumed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_shared::types::{InvoiceLineId, ProfitLossMode};

use crate::invoice::calculator::{self, InvoiceCalculator};
use crate::invoice::error::InvoiceError;
use crate::invoice::types::InvoiceLine;

/// Units taken from one cost layer for one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConsumption {
    /// The purchase line that was consumed.
    pub layer_id: InvoiceLineId,
    /// Units taken.
    pub consumed: u32,
    /// Units left on the layer afterwards.
    pub remaining: u32,
    /// Tax-inclusive cost of the consumed units.
    pub purchase_cost: Decimal,
    /// Tax-inclusive sale value of the consumed units.
    pub sale_value: Decimal,
}

impl LayerConsumption {
    /// Sale value minus purchase cost for this slice.
    ///
    /// Both values are non-negative, so the difference always fits.
    #[must_use]
    pub fn margin(&self) -> Decimal {
        self.sale_value - self.purchase_cost
    }
}

/// Result of matching one sales line against the cost layers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Layers touched, oldest first.
    pub consumptions: Vec<LayerConsumption>,
    /// Profit/loss to record on the sales line.
    pub profit_loss: Decimal,
    /// Units the purchase history could not cover.
    pub unmatched: u32,
}

impl MatchOutcome {
    /// Units covered by purchase history.
    #[must_use]
    pub fn matched(&self) -> u32 {
        self.consumptions.iter().map(|c| c.consumed).sum()
    }
}

/// Stateless FIFO matching engine.
pub struct FifoMatcher;

impl FifoMatcher {
    /// Consume `layers` (oldest first) to cover `sale.quantity`.
    ///
    /// Decrements `remaining_quantity` on every layer it draws from. Running
    /// out of layers is not an error; the shortfall is reported as
    /// `unmatched`. Stock sufficiency is validated before matching.
    ///
    /// With [`ProfitLossMode::LastLayer`] each layer overwrites the
    /// profit/loss, so a sale spanning several layers reports only the
    /// last slice's margin. [`ProfitLossMode::Cumulative`] sums them.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::AmountOverflow` if a value or margin overflows.
    pub fn match_sale(
        sale: &InvoiceLine,
        layers: &mut [InvoiceLine],
        mode: ProfitLossMode,
    ) -> Result<MatchOutcome, InvoiceError> {
        let mut outcome = MatchOutcome::default();
        let mut needed = sale.quantity;

        for layer in layers.iter_mut() {
            if needed == 0 {
                break;
            }
            if layer.remaining_quantity == 0 {
                continue;
            }

            let consumed = layer.remaining_quantity.min(needed);
            layer.remaining_quantity -= consumed;

            let consumption = LayerConsumption {
                layer_id: layer.id,
                consumed,
                remaining: layer.remaining_quantity,
                purchase_cost: InvoiceCalculator::line_gross_value(
                    layer.price,
                    consumed,
                    layer.tax,
                )?,
                sale_value: InvoiceCalculator::line_gross_value(sale.price, consumed, sale.tax)?,
            };

            outcome.profit_loss = match mode {
                ProfitLossMode::LastLayer => consumption.margin(),
                ProfitLossMode::Cumulative => {
                    calculator::add(outcome.profit_loss, consumption.margin())?
                }
            };

            needed -= consumed;
            outcome.consumptions.push(consumption);
        }

        outcome.unmatched = needed;
        Ok(outcome)
    }

    /// Turn an approved purchase line into a fresh cost layer.
    pub fn open_layer(line: &mut InvoiceLine) {
        line.profit_loss = Decimal::ZERO;
        line.remaining_quantity = line.quantity;
    }

    /// Close out an approved sales line; sales never carry a layer.
    pub fn close_sale(line: &mut InvoiceLine, outcome: &MatchOutcome) {
        line.profit_loss = outcome.profit_loss;
        line.remaining_quantity = 0;
    }
}
