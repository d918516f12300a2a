//! Shared types and configuration for Stockbook.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Profit/loss valuation mode for cost matching
//! - Configuration management

pub mod config;
pub mod types;

pub use config::{AppConfig, LedgerConfig, LoggingConfig};
pub use types::ProfitLossMode;
