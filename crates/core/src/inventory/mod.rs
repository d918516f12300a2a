//! Stock counters and FIFO cost layers.

pub mod fifo;
pub mod stock;

#[cfg(test)]
mod fifo_props;

pub use fifo::{FifoMatcher, LayerConsumption, MatchOutcome};
pub use stock::{StockAccessor, StockLedger};
