//! Identifiers of the stock book's entities.
//!
//! Each entity gets its own UUID v7 newtype, so an `InvoiceLineId` can never
//! be handed to a lookup expecting a `ProductId`. Ids are time-ordered and
//! serialize as bare UUID strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A string that is not a valid id of the named entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} id `{input}`")]
pub struct IdParseError {
    /// Entity the id was meant for, e.g. `invoice`.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}

macro_rules! entity_ids {
    ($($(#[$meta:meta])* $name:ident => $kind:literal),+ $(,)?) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Entity name used in parse errors.
            pub const KIND: &'static str = $kind;

            /// A fresh time-ordered id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|_| IdParseError {
                    kind: Self::KIND,
                    input: s.to_string(),
                })
            }
        }
    )+};
}

entity_ids! {
    /// Company (tenant) owning invoices and products.
    CompanyId => "company",
    /// Sales or purchase invoice.
    InvoiceId => "invoice",
    /// Line of an invoice; approved purchase lines double as cost layers.
    InvoiceLineId => "invoice line",
    /// Stock-keeping product.
    ProductId => "product",
    /// Client or vendor named on an invoice.
    ClientVendorId => "client/vendor",
}
