//! Common types used across the application.

pub mod id;
pub mod valuation;


pub use id::*;
pub use valuation::ProfitLossMode;
