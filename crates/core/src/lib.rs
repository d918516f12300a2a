//! Core business logic for Stockbook.
//!
//! This crate contains pure business logic with ZERO storage dependencies.
//! Persistence is reached only through the traits in [`invoice::store`].
//!
//! # Modules
//!
//! - `invoice` - Invoice types, totals, numbering and the approval workflow
//! - `inventory` - Stock counters and FIFO cost matching

pub mod inventory;
pub mod invoice;
